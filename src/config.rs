//! Configuration management for Portal Fetcher
//!
//! Unified configuration with multi-source loading and zero-config defaults:
//! built-in values, then an optional TOML file from standard locations, then
//! CLI overrides applied by the command handlers. Durations are written
//! human-style (`"500ms"`, `"1h"`) via humantime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::client::ClientConfig;
use crate::app::{ListingCache, OrchestratorConfig};
use crate::constants::{cache, files, limits, portal, workers};
use crate::errors::{ConfigError, Result};

/// Unified application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Portal endpoints and listing shape
    pub portal: PortalConfig,
    /// Download behaviour
    pub download: DownloadConfig,
    /// Listing cache settings
    pub cache: CacheConfig,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Portal endpoints and listing extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Display name used in logging
    pub name: String,
    /// Base URL documents are served from
    pub base_url: String,
    /// Full URL of the listing page
    pub listing_url: String,
    /// Path appended to the base URL to fetch one document by id
    pub document_path: String,
    /// Substring filter on the document type label (empty = everything)
    pub type_filter: String,
    /// Content type documents are expected to carry
    pub expected_content_type: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            name: "portal".to_string(),
            base_url: String::new(),
            listing_url: String::new(),
            document_path: portal::DOCUMENT_PATH.to_string(),
            type_filter: String::new(),
            expected_content_type: portal::EXPECTED_CONTENT_TYPE.to_string(),
        }
    }
}

impl PortalConfig {
    /// URL prefix a document id is appended to
    pub fn document_url_base(&self) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, self.document_path)
        } else {
            format!("{}/{}", self.base_url, self.document_path)
        }
    }
}

/// Download behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Destination directory for downloaded documents
    pub directory: PathBuf,
    /// Politeness delay between requests
    #[serde(with = "humantime_serde")]
    pub request_delay: Duration,
    /// Lower bound of the uniform jitter factor on the request delay
    pub jitter_min: f64,
    /// Upper bound of the uniform jitter factor on the request delay
    pub jitter_max: f64,
    /// Apply the sequential delay even to files skipped via the existence
    /// check
    pub delay_on_skip: bool,
    /// Apply the jitter delay in concurrent mode too
    pub delay_in_concurrent: bool,
    /// Worker pool size for concurrent mode
    pub worker_count: usize,
    /// Documents per batch window (0 = all)
    pub batch_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(files::DEFAULT_DOWNLOAD_DIR),
            request_delay: limits::REQUEST_DELAY,
            jitter_min: limits::JITTER_MIN,
            jitter_max: limits::JITTER_MAX,
            delay_on_skip: false,
            delay_in_concurrent: false,
            worker_count: workers::DEFAULT_WORKER_COUNT,
            batch_size: 0,
        }
    }
}

/// Listing cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the listing cache
    pub enabled: bool,
    /// Cache file path (defaults to `document_cache.json` in the working
    /// directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Cache expiry measured against the file's mtime
    #[serde(with = "humantime_serde")]
    pub expiry: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
            expiry: cache::DEFAULT_EXPIRY,
        }
    }
}

impl CacheConfig {
    /// Resolved cache file path
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| PathBuf::from(cache::DEFAULT_CACHE_FILE))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration, preferring an explicit file over standard
    /// locations and falling back to defaults when none exists
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Look for a configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut candidates = vec![
            PathBuf::from("./portal-fetcher.toml"),
            PathBuf::from("./config.toml"),
        ];
        if let Some(path) = Self::default_config_path() {
            candidates.push(path);
        }

        for path in candidates {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }
        None
    }

    /// Default per-user config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("portal-fetcher").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::InvalidFormat)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write a commented default configuration file
    pub async fn write_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Validate values that would make a run misbehave
    pub fn validate(&self) -> Result<()> {
        if self.download.worker_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "download.worker_count".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.download.worker_count > workers::MAX_WORKER_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "download.worker_count".to_string(),
                reason: format!("must be at most {}", workers::MAX_WORKER_COUNT),
            }
            .into());
        }
        if self.download.jitter_min < 0.0 || self.download.jitter_min > self.download.jitter_max {
            return Err(ConfigError::InvalidValue {
                field: "download.jitter_min".to_string(),
                reason: "jitter range must satisfy 0 <= min <= max".to_string(),
            }
            .into());
        }
        self.client.validate()?;
        Ok(())
    }

    /// Validate the portal endpoints needed for a fetch run
    pub fn validate_for_fetch(&self) -> Result<()> {
        self.validate()?;
        for (field, value) in [
            ("portal.base_url", &self.portal.base_url),
            ("portal.listing_url", &self.portal.listing_url),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be set (see `portal_fetcher config init`)".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Orchestrator settings derived from this configuration
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            destination: self.download.directory.clone(),
            worker_count: self.download.worker_count,
            request_delay: self.download.request_delay,
            jitter: (self.download.jitter_min, self.download.jitter_max),
            delay_on_skip: self.download.delay_on_skip,
            delay_in_concurrent: self.download.delay_in_concurrent,
        }
    }

    /// Listing cache handle derived from this configuration
    pub fn listing_cache(&self) -> ListingCache {
        ListingCache::new(self.cache.file_path(), self.cache.expiry, self.cache.enabled)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Portal Fetcher Configuration
# Edit these values to match your target portal.

[portal]
# Display name used in logging
name = "YourCouncil"

# Base URL documents are served from
base_url = "https://publicaccess.yourcouncil.gov.uk/PublicAccess_LIVE/"

# Full URL of the search-result page that embeds the document listing
listing_url = "https://publicaccess.yourcouncil.gov.uk/PublicAccess_LIVE/SearchResult/RunThirdPartySearch?FileSystemid=PL&FOLDER1_REF=123456"

# Path appended to the base URL to fetch one document by id
document_path = "{document_path}"

# Only download documents whose type contains this string ("" = everything)
type_filter = "Planning Comments"

# Content type documents are expected to carry (mismatch logs a warning)
expected_content_type = "{content_type}"

[download]
# Destination directory for downloaded documents
directory = "{download_dir}"

# Politeness delay between requests in sequential mode
request_delay = "500ms"

# Uniform jitter factor range applied to the request delay
jitter_min = {jitter_min}
jitter_max = {jitter_max}

# Apply the delay even to files skipped because they already exist
delay_on_skip = false

# Apply the jitter delay in concurrent mode too (the worker bound already
# paces the portal, so this is usually unnecessary)
delay_in_concurrent = false

# Worker pool size for --concurrent runs
worker_count = {worker_count}

# Documents per batch window (0 = all)
batch_size = 0

[cache]
# Cache the extracted listing between runs
enabled = true

# Cache file path (defaults to ./document_cache.json)
# file = "/path/to/document_cache.json"

# Cache expiry
expiry = "1h"

[client]
# request headers sent with every request
user_agent = "{user_agent}"

# Timeouts
request_timeout = "30s"
connect_timeout = "10s"

# Retry policy: attempt n waits retry_base_delay * 2^n before the next try
retry_attempts = {retry_attempts}
retry_base_delay = "1s"

[logging]
# error, warn, info, debug, trace
level = "info"
"#,
            document_path = portal::DOCUMENT_PATH,
            content_type = portal::EXPECTED_CONTENT_TYPE,
            download_dir = files::DEFAULT_DOWNLOAD_DIR,
            jitter_min = limits::JITTER_MIN,
            jitter_max = limits::JITTER_MAX,
            worker_count = workers::DEFAULT_WORKER_COUNT,
            user_agent = crate::constants::http::USER_AGENT,
            retry_attempts = limits::RETRY_ATTEMPTS,
        )
    }
}
