//! Portal Fetcher CLI application
//!
//! Command-line interface for downloading documents from a planning portal.
//! Features sequential and concurrent downloads, listing caching, and
//! idempotent resume across runs.

use std::process;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use portal_fetcher::cli::{handle_cache, handle_config, handle_fetch, Cli, Commands};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(&cli);

    info!("Portal Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    // Execute the appropriate command
    match cli.command {
        Commands::Fetch(args) => handle_fetch(&cli.global, args)
            .await
            .context("fetch failed"),
        Commands::Cache(args) => handle_cache(&cli.global, args)
            .await
            .context("cache command failed"),
        Commands::Config(args) => handle_config(&cli.global, args)
            .await
            .context("config command failed"),
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("portal_fetcher={}", log_level).parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
