//! Error types for Portal Fetcher
//!
//! This module defines the error types for all components of the application.
//! Errors are designed to be actionable: transient conditions stay retryable,
//! everything that ends a run carries enough context to explain why.

use std::path::PathBuf;

use thiserror::Error;

/// HTTP fetch and per-document download errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Underlying HTTP request failed (connect, timeout, mid-stream)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A configured request header is not a valid HTTP header
    #[error("invalid request header '{name}'")]
    InvalidHeader { name: String },

    /// File I/O failed while writing the response body
    #[error("file I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic rename from temp file to final destination failed
    #[error("could not move {temp_path} into place at {final_path}")]
    AtomicRename {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// All attempts exhausted; `last` is the error of the final attempt
    #[error("all {attempts} attempts failed")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) | FetchError::Status { .. } => true,
            FetchError::InvalidUrl { .. }
            | FetchError::InvalidHeader { .. }
            | FetchError::Io { .. }
            | FetchError::AtomicRename { .. }
            | FetchError::RetriesExhausted { .. } => false,
        }
    }
}

/// Listing page extraction errors
#[derive(Error, Debug)]
pub enum ListingError {
    /// The embedded document model was not found in the page
    #[error("could not find document data in the listing page")]
    ModelNotFound,

    /// The embedded model was not valid JSON
    #[error("embedded document model is not valid JSON")]
    JsonParse(#[from] serde_json::Error),

    /// The model parsed but the row array was missing
    #[error("no '{key}' array found in the document model")]
    MissingRows { key: String },

    /// The listing page could not be fetched at all
    #[error("failed to fetch listing page")]
    Fetch(#[from] FetchError),
}

/// Listing cache errors
///
/// These never abort a run: readers downgrade them to a cache miss and
/// writers log and continue.
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error reading or writing the cache file
    #[error("cache file I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file exists but does not deserialize
    #[error("cache file corrupt at {path}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Descriptor list could not be serialized
    #[error("cache serialization failed")]
    Serialize(#[source] serde_json::Error),
}

/// Batch window selection errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    /// Start index lies beyond the filtered sequence
    #[error("start index {start} is beyond the document list (length {length})")]
    StartBeyondLength { start: usize, length: usize },

    /// Start index exceeds the explicit end index
    #[error("start index {start} is after end index {end}")]
    StartAfterEnd { start: usize, end: usize },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// I/O error reading or writing configuration
    #[error("configuration file I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Listing extraction error
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Batch selection error
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("{message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Listing(_) => "listing",
            AppError::Cache(_) => "cache",
            AppError::Batch(_) => "batch",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Listing result type alias
pub type ListingResult<T> = std::result::Result<T, ListingError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Batch result type alias
pub type BatchResult<T> = std::result::Result<T, BatchError>;
