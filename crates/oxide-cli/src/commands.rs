//! CLI command definitions.

use crate::config::OutputFormat;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Restore a cache archive from the object store
    Restore(RestoreArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RestoreArgs {
    /// Cache key, most preferred first (repeatable)
    #[arg(short, long = "key")]
    pub keys: Vec<String>,

    /// Newline-separated cache keys, appended after --key values
    #[arg(long, env = "OXIDE_CACHE_KEYS")]
    pub key_list: Option<String>,

    /// Where to write the archive
    #[arg(short, long)]
    pub path: PathBuf,

    /// Extra download attempts after the first failure
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Bucket name
    #[arg(long)]
    pub bucket: Option<String>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub force_path_style: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Key
        key: String,

        /// Value
        value: String,
    },
}
