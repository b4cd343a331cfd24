//! Oxide cache restore CLI entrypoint.

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;


use commands::{Commands, ConfigCommands};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "oxide")]
#[command(author, version, about = "Oxide CI cache restore", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("✗").red(), e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        let invalid_input = e
            .downcast_ref::<oxide_core::Error>()
            .is_some_and(oxide_core::Error::is_validation);
        std::process::exit(if invalid_input { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::load()?;

    match cli.command {
        Commands::Restore(args) => handlers::restore(&config, &args).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}
