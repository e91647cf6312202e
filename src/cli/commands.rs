//! Command handlers for the Portal Fetcher CLI
//!
//! Each handler loads configuration, applies CLI overrides, and drives the
//! library components. Per-document failures are reported in the summary and
//! do not affect the exit status; only unrecoverable errors (configuration,
//! listing fetch) propagate as `Err` and terminate with a non-zero exit.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::info;

use crate::app::{
    fetch_listing, BatchWindow, DownloadOrchestrator, EmbeddedModelExtractor, ExecutionMode,
    PortalClient, RunReport,
};
use crate::cli::args::{CacheAction, CacheArgs, ConfigAction, ConfigArgs, FetchArgs, GlobalArgs};
use crate::cli::progress::{download_progress_bar, render_progress};
use crate::config::AppConfig;
use crate::constants::workers;
use crate::errors::{AppError, Result};

/// Run the whole pipeline: listing, filter, window, download, report
pub async fn handle_fetch(global: &GlobalArgs, args: FetchArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let mut config = AppConfig::load(global.config.clone()).await?;
    apply_fetch_overrides(&mut config, &args);
    config.validate_for_fetch()?;

    info!("Starting {} document downloader", config.portal.name);

    let client = Arc::new(PortalClient::new(
        &config.client,
        config.portal.document_url_base(),
        config.portal.expected_content_type.clone(),
    )?);

    // Cache hit avoids re-fetching the listing entirely; a miss falls
    // through to the portal and refreshes the cache on the way out.
    let cache = config.listing_cache();
    let all_documents = match cache.load() {
        Some(documents) => documents,
        None => {
            let extractor = EmbeddedModelExtractor::default();
            let documents =
                fetch_listing(&client, &config.portal.listing_url, &extractor).await?;
            cache.save(&documents);
            documents
        }
    };

    let filter = config.portal.type_filter.clone();
    let filtered: Vec<_> = all_documents
        .into_iter()
        .filter(|document| document.matches_type(&filter))
        .collect();
    info!(
        "Found {} documents matching filter '{}'",
        filtered.len(),
        filter
    );

    let window = BatchWindow::new(args.start, args.end);
    let range = window.resolve(filtered.len(), config.download.batch_size)?;
    if range.start > 0 || range.end < filtered.len() {
        info!("Processing batch from index {} to {}", range.start, range.end);
    }
    let selection = &filtered[range];

    if args.dry_run {
        println!(
            "Would download {} documents to {}",
            selection.len(),
            config.download.directory.display()
        );
        for document in selection {
            println!("  {} ({})", document.reference, document.doc_type);
        }
        return Ok(());
    }

    let mode = if args.concurrent {
        info!(
            "Using concurrent mode with {} workers",
            config.download.worker_count
        );
        ExecutionMode::Concurrent
    } else {
        ExecutionMode::Sequential
    };

    let orchestrator = DownloadOrchestrator::new(client, config.orchestrator_config());
    let (progress_tx, progress_rx) = mpsc::channel(workers::PROGRESS_CHANNEL_CAPACITY);
    let renderer = tokio::spawn(render_progress(
        progress_rx,
        download_progress_bar(selection.len()),
    ));

    let started_at = Utc::now();
    let start = Instant::now();
    let batch = orchestrator.run(selection, mode, Some(progress_tx)).await?;
    let _ = renderer.await;

    let report = RunReport::from_batch(&batch, started_at, start.elapsed());
    println!("{}", report.summary());
    println!("Files saved to {}", config.download.directory.display());

    Ok(())
}

/// Apply per-run CLI overrides on top of the loaded configuration
fn apply_fetch_overrides(config: &mut AppConfig, args: &FetchArgs) {
    if let Some(worker_count) = args.workers {
        config.download.worker_count = worker_count;
    }
    if let Some(batch_size) = args.batch {
        config.download.batch_size = batch_size;
    }
    if let Some(directory) = &args.directory {
        config.download.directory = directory.clone();
    }
    if let Some(type_filter) = &args.type_filter {
        config.portal.type_filter = type_filter.clone();
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
}

/// Inspect or invalidate the listing cache
pub async fn handle_cache(global: &GlobalArgs, args: CacheArgs) -> Result<()> {
    let config = AppConfig::load(global.config.clone()).await?;
    let cache = config.listing_cache();

    match args.action {
        CacheAction::Info => {
            let status = cache.status();
            println!("Cache file: {}", status.path.display());
            match status.entries {
                Some(entries) => {
                    println!("Entries: {}", entries);
                    let age = status
                        .age
                        .map(|age| format!("{}s", age.as_secs()))
                        .unwrap_or_else(|| "unknown".to_string());
                    println!("Age: {} (expires after {}s)", age, status.expiry.as_secs());
                }
                None => println!("No readable cache present"),
            }
        }
        CacheAction::Clear => {
            if cache.clear()? {
                println!("Cache cleared");
            } else {
                println!("No cache file to remove");
            }
        }
    }
    Ok(())
}

/// Generate or display configuration
pub async fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = global
                .config
                .clone()
                .or_else(AppConfig::default_config_path)
                .ok_or_else(|| AppError::generic("could not determine user config directory"))?;

            if path.exists() && !force {
                return Err(AppError::generic(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }

            AppConfig::write_default_file(&path).await?;
            println!("Wrote default configuration to {}", path.display());
            println!("Edit it to point at your portal, then run `portal_fetcher fetch`.");
        }
        ConfigAction::Show => {
            let config = AppConfig::load(global.config.clone()).await?;
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| AppError::generic(format!("failed to render configuration: {}", e)))?;
            print!("{}", rendered);
        }
    }
    Ok(())
}
