//! Core application logic for Portal Fetcher
//!
//! This module contains the main application components: the HTTP client and
//! retry machinery, listing extraction, the listing cache, batch windowing,
//! the download orchestrator, and run reporting.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use portal_fetcher::app::{
//!     DownloadOrchestrator, EmbeddedModelExtractor, ExecutionMode, OrchestratorConfig,
//!     PortalClient, fetch_listing,
//! };
//! use portal_fetcher::app::client::ClientConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(PortalClient::new(
//!     &ClientConfig::default(),
//!     "https://portal.example.gov.uk/Document/ViewDocument?id=",
//!     "application/pdf",
//! )?);
//!
//! let extractor = EmbeddedModelExtractor::default();
//! let documents = fetch_listing(
//!     &client,
//!     "https://portal.example.gov.uk/SearchResult/RunThirdPartySearch?FOLDER1_REF=123456",
//!     &extractor,
//! )
//! .await?;
//!
//! let orchestrator = DownloadOrchestrator::new(client, OrchestratorConfig::default());
//! let report = orchestrator
//!     .run(&documents, ExecutionMode::Concurrent, None)
//!     .await?;
//! println!("{} downloaded", report.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod client;
pub mod filename;
pub mod listing;
pub mod models;
pub mod orchestrator;
pub mod report;

// Re-export main public API
pub use batch::BatchWindow;
pub use cache::{CacheStatus, ListingCache};
pub use client::{ClientConfig, DocumentFetcher, PortalClient, RetryPolicy};
pub use filename::sanitize_reference;
pub use listing::{fetch_listing, EmbeddedModelExtractor, ListingExtractor};
pub use models::{DocumentDescriptor, DownloadOutcome, DownloadTask, OutcomeStatus};
pub use orchestrator::{
    BatchReport, DownloadOrchestrator, ExecutionMode, OrchestratorConfig, ProgressUpdate,
};
pub use report::RunReport;
