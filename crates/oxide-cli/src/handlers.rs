//! Command handlers.

use crate::commands::RestoreArgs;
use crate::config::{CliConfig, OutputFormat};
use console::style;
use oxide_cache::{CacheRestorer, S3Settings, parse_key_list};
use oxide_core::cache::{DownloadRequest, RestoreOutcome};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Merge `--key` values and the newline-separated key block, in that order.
pub fn collect_keys(args: &RestoreArgs) -> Vec<String> {
    let mut keys = args.keys.clone();
    if let Some(block) = &args.key_list {
        keys.extend(parse_key_list(block));
    }
    keys
}

/// Apply command-line overrides on top of the configured store settings.
pub fn storage_settings(config: &CliConfig, args: &RestoreArgs) -> S3Settings {
    let mut settings = config.storage.clone();
    if let Some(bucket) = &args.bucket {
        settings.bucket = bucket.clone();
    }
    if let Some(region) = &args.region {
        settings.region = Some(region.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = Some(endpoint.clone());
    }
    if args.force_path_style {
        settings.force_path_style = true;
    }
    settings
}

/// Build the restore request from arguments and configuration.
pub fn build_request(config: &CliConfig, args: &RestoreArgs) -> DownloadRequest {
    DownloadRequest {
        cache_keys: collect_keys(args),
        destination: args.path.clone(),
        max_retries: args.retries.unwrap_or(config.max_retries),
    }
}

/// Restore a cache archive.
pub async fn restore(
    config: &CliConfig,
    args: &RestoreArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = build_request(config, args);
    let restorer = CacheRestorer::new(storage_settings(config, args));

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling restore");
                cancel.cancel();
            }
        })
    };

    let result = restorer.restore(&request, &cancel).await;
    interrupt.abort();

    match result {
        Ok(outcome) => print_outcome(&outcome, args.output.unwrap_or(config.output_format)),
        Err(e) if e.is_cache_miss() => {
            println!("{} {}", style("!").yellow(), e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(
    outcome: &RestoreOutcome,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => {
            let kind = if outcome.exact_match {
                "exact match"
            } else {
                "prefix match"
            };
            println!(
                "{} Restored {} ({})",
                style("✓").green(),
                style(&outcome.matched_key).bold(),
                kind
            );
            println!("  Bytes: {}", outcome.bytes_written);
            println!("  Attempts: {}", outcome.attempts);
            println!("  Duration: {}ms", outcome.duration_ms);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(outcome)?),
    }
    Ok(())
}

/// Show configuration.
pub fn show_config(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage = &config.storage;
    let not_set = "(not set)";

    println!("Current configuration:");
    println!(
        "  bucket: {}",
        if storage.bucket.is_empty() {
            not_set
        } else {
            storage.bucket.as_str()
        }
    );
    println!("  region: {}", storage.region.as_deref().unwrap_or(not_set));
    println!(
        "  endpoint: {}",
        storage.endpoint.as_deref().unwrap_or(not_set)
    );
    println!("  force_path_style: {}", storage.force_path_style);
    println!(
        "  credentials: {}",
        if storage.access_key_id.is_some() && storage.secret_access_key.is_some() {
            "static (***)"
        } else {
            "default provider chain"
        }
    );
    println!("  max_retries: {}", config.max_retries);
    println!("  output_format: {:?}", config.output_format);

    if let Ok(path) = CliConfig::config_path() {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set configuration.
pub fn set_config(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Environment overrides are not persisted.
    let mut config = CliConfig::load_file()?;
    config.set(key, value)?;
    config.save()?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}
