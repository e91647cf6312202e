//! Listing cache with mtime-based expiry and atomic writes
//!
//! Fetching and parsing the portal listing is by far the slowest part of a
//! small run, so the extracted descriptor list is persisted as a JSON array
//! and reused until it expires. The cache is strictly best-effort: corrupt or
//! unreadable files count as a miss, and write failures are logged and
//! swallowed. Writes go through a temp file in the same directory followed by
//! a rename, so a reader can never observe a valid-but-truncated list.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::app::models::DocumentDescriptor;
use crate::errors::{CacheError, CacheResult};

/// Persisted listing cache
#[derive(Debug, Clone)]
pub struct ListingCache {
    path: PathBuf,
    expiry: Duration,
    enabled: bool,
}

/// Snapshot of the cache file for user-facing inspection
#[derive(Debug, Clone)]
pub struct CacheStatus {
    /// Path of the cache file
    pub path: PathBuf,
    /// Number of cached descriptors, if the file is present and readable
    pub entries: Option<usize>,
    /// Age of the cache file, if present
    pub age: Option<Duration>,
    /// Configured expiry
    pub expiry: Duration,
}

impl ListingCache {
    /// Create a cache handle
    pub fn new(path: impl Into<PathBuf>, expiry: Duration, enabled: bool) -> Self {
        Self {
            path: path.into(),
            expiry,
            enabled,
        }
    }

    /// The cache file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached descriptor list, if it is present and fresh
    ///
    /// Returns `None` when caching is disabled, the file is absent, the file
    /// is older than the expiry, or the contents do not deserialize. None of
    /// these conditions are fatal.
    pub fn load(&self) -> Option<Vec<DocumentDescriptor>> {
        if !self.enabled {
            return None;
        }

        match self.try_load() {
            Ok(Some(documents)) => {
                info!("Loaded {} documents from cache", documents.len());
                Some(documents)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Treating cache as absent: {}", e);
                None
            }
        }
    }

    fn try_load(&self) -> CacheResult<Option<Vec<DocumentDescriptor>>> {
        if !self.path.exists() {
            debug!("No cache file at {}", self.path.display());
            return Ok(None);
        }

        if let Some(age) = self.age()? {
            if age >= self.expiry {
                info!("Cache expired (age {:?} exceeds {:?})", age, self.expiry);
                return Ok(None);
            }
        }

        let contents = std::fs::read(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;

        let documents =
            serde_json::from_slice(&contents).map_err(|source| CacheError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(Some(documents))
    }

    /// Persist the descriptor list, best-effort
    ///
    /// Failure to write never blocks the run; it is logged and the run
    /// continues with the freshly fetched listing.
    pub fn save(&self, documents: &[DocumentDescriptor]) {
        if !self.enabled {
            return;
        }

        match self.try_save(documents) {
            Ok(()) => info!("Saved {} documents to cache", documents.len()),
            Err(e) => warn!("Skipping cache save: {}", e),
        }
    }

    fn try_save(&self, documents: &[DocumentDescriptor]) -> CacheResult<()> {
        let json = serde_json::to_vec(documents).map_err(CacheError::Serialize)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        // Temp file in the target directory so the rename stays on one
        // filesystem and is atomic.
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        temp.write_all(&json).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        temp.flush().map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        temp.persist(&self.path).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e.error,
        })?;

        Ok(())
    }

    /// Delete the cache file, forcing a listing refresh on the next run
    pub fn clear(&self) -> CacheResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("Removed cache file {}", self.path.display());
        Ok(true)
    }

    /// Inspect the cache file without consuming it
    pub fn status(&self) -> CacheStatus {
        let age = self.age().ok().flatten();
        let entries = std::fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Vec<DocumentDescriptor>>(&bytes).ok())
            .map(|docs| docs.len());

        CacheStatus {
            path: self.path.clone(),
            entries,
            age,
            expiry: self.expiry,
        }
    }

    /// Age of the cache file since last write, if it exists
    fn age(&self) -> CacheResult<Option<Duration>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let metadata = std::fs::metadata(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(SystemTime::now().duration_since(modified).ok())
    }
}
