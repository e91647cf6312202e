//! Application constants for Portal Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 25;
}

/// Retry and politeness configuration
pub mod limits {
    use super::Duration;

    /// Maximum attempts for a failing request
    pub const RETRY_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff; attempt n waits `base * 2^n`
    pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Default delay between requests in sequential mode
    pub const REQUEST_DELAY: Duration = Duration::from_millis(500);

    /// Lower bound of the uniform jitter factor applied to the request delay
    pub const JITTER_MIN: f64 = 0.5;

    /// Upper bound of the uniform jitter factor applied to the request delay
    pub const JITTER_MAX: f64 = 1.0;
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of concurrent download workers
    pub const DEFAULT_WORKER_COUNT: usize = 8;

    /// Maximum recommended concurrent workers
    pub const MAX_WORKER_COUNT: usize = 32;

    /// Buffer size for the orchestrator progress event channel
    pub const PROGRESS_CHANNEL_CAPACITY: usize = 100;
}

/// File naming and on-disk layout
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Extension appended to sanitized document filenames
    pub const DOCUMENT_EXTENSION: &str = ".pdf";

    /// Maximum filename length before the extension is appended
    pub const MAX_STEM_LENGTH: usize = 100;

    /// Default destination directory for downloaded documents
    pub const DEFAULT_DOWNLOAD_DIR: &str = "downloaded-pdfs";
}

/// Listing cache defaults
pub mod cache {
    use super::Duration;

    /// Default cache file name
    pub const DEFAULT_CACHE_FILE: &str = "document_cache.json";

    /// Default cache expiry (1 hour)
    pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(3600);
}

/// Portal endpoint defaults
pub mod portal {
    /// Path appended to the base URL to fetch one document by id
    pub const DOCUMENT_PATH: &str = "Document/ViewDocument?id=";

    /// Content type documents are expected to carry
    pub const EXPECTED_CONTENT_TYPE: &str = "application/pdf";

    /// JavaScript model pattern embedding the document listing
    pub const MODEL_PATTERN: &str = r"(?s)var model =(\{.*?\});";

    /// Key of the row array inside the embedded model
    pub const ROWS_KEY: &str = "Rows";

    /// Row field carrying the opaque document identifier
    pub const ID_FIELD: &str = "Guid";

    /// Row field carrying the human-readable reference
    pub const REFERENCE_FIELD: &str = "Doc_Ref2";

    /// Row field carrying the document type label
    pub const TYPE_FIELD: &str = "Doc_Type";
}

// Re-export commonly used constants for convenience
pub use cache::DEFAULT_EXPIRY as CACHE_EXPIRY;
pub use files::{DOCUMENT_EXTENSION, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{REQUEST_DELAY, RETRY_ATTEMPTS, RETRY_BASE_DELAY};
pub use workers::DEFAULT_WORKER_COUNT;
