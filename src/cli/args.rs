//! Command-line argument parsing for Portal Fetcher
//!
//! This module defines the CLI structure using clap derive macros. The
//! `fetch` command carries the knobs that vary run-to-run (mode, window,
//! workers); everything else lives in the configuration file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Portal Fetcher - download documents from a planning portal
#[derive(Parser, Debug)]
#[command(
    name = "portal_fetcher",
    version,
    about = "Download documents listed on a planning portal",
    long_about = "Downloads documents listed on a planning portal to local storage, \
with listing caching, bounded retries, and optional concurrent fetch. \
Already-downloaded files are never re-fetched, so interrupted runs can simply be re-run."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the listing and download matching documents
    Fetch(FetchArgs),

    /// Listing cache management
    Cache(CacheArgs),

    /// Configuration management
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Download with a bounded worker pool instead of sequentially
    #[arg(long)]
    pub concurrent: bool,

    /// Number of concurrent download workers
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Starting document index within the filtered listing
    #[arg(long, default_value_t = 0)]
    pub start: usize,

    /// Ending document index (exclusive)
    #[arg(long)]
    pub end: Option<usize>,

    /// Batch size (overrides the configured value; 0 for all)
    #[arg(short, long)]
    pub batch: Option<usize>,

    /// Disable the listing cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Destination directory (overrides the configured value)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Document type filter (overrides the configured value)
    #[arg(short = 't', long, value_name = "SUBSTRING")]
    pub type_filter: Option<String>,

    /// List what would be downloaded without downloading
    #[arg(long)]
    pub dry_run: bool,
}

impl FetchArgs {
    /// Reject values clap cannot express as constraints
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Number of workers must be greater than 0".to_string());
        }
        if let Some(end) = self.end {
            if self.start > end {
                return Err(format!(
                    "Start index {} is after end index {}",
                    self.start, end
                ));
            }
        }
        Ok(())
    }
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache file location, entry count, and age
    Info,

    /// Delete the cache file, forcing a listing refresh next run
    Clear,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::TRACE
        } else if self.global.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
