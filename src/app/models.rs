//! Data models for Portal Fetcher
//!
//! This module defines the core data structures used throughout the
//! application: the document descriptor extracted from the portal listing,
//! the per-document download task, and the outcome produced for each task.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Minimal record describing one downloadable document
///
/// Descriptors are created by the listing extractor (or loaded from the
/// cache), are immutable once extracted, and live for one run. Identity is
/// the `id` field; the `reference` is only used to derive the on-disk
/// filename and for user-facing reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Opaque identifier used to build the download URL
    pub id: String,
    /// Human-readable reference used to derive the filename
    pub reference: String,
    /// Category label the type filter matches against
    pub doc_type: String,
}

impl DocumentDescriptor {
    /// Create a new descriptor
    pub fn new(
        id: impl Into<String>,
        reference: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            reference: reference.into(),
            doc_type: doc_type.into(),
        }
    }

    /// Whether this document's type matches a substring filter
    ///
    /// An empty filter matches everything.
    pub fn matches_type(&self, filter: &str) -> bool {
        self.doc_type.contains(filter)
    }
}

/// A single unit of download work, derived from a descriptor
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// The document to fetch
    pub descriptor: DocumentDescriptor,
    /// Absolute target path inside the destination directory
    pub target: PathBuf,
}

/// Terminal state of one download task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Bytes were fetched and written to disk
    Downloaded { file_name: String, bytes: u64 },
    /// Target file already existed; no network call was made
    Skipped { file_name: String },
    /// The task failed after exhausting retries
    Failed { reason: String },
}

/// Result produced exactly once per task, never mutated after creation
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// The descriptor the task was created from
    pub descriptor: DocumentDescriptor,
    /// What happened
    pub status: OutcomeStatus,
}

impl DownloadOutcome {
    /// Whether the task ended in success (downloaded or already present)
    pub fn is_success(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// Whether the task was satisfied from disk without a network call
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    /// The resulting filename, if the task succeeded
    pub fn file_name(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Downloaded { file_name, .. }
            | OutcomeStatus::Skipped { file_name } => Some(file_name),
            OutcomeStatus::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(doc_type: &str) -> DocumentDescriptor {
        DocumentDescriptor::new("c1a2b3", "24/01234/FUL-COMMENT-1", doc_type)
    }

    #[test]
    fn test_type_filter_matching() {
        let doc = descriptor("Planning Comments");
        assert!(doc.matches_type("Planning Comments"));
        assert!(doc.matches_type("Comments"));
        assert!(doc.matches_type(""));
        assert!(!doc.matches_type("Decision Notice"));
    }

    #[test]
    fn test_outcome_success_states() {
        let downloaded = DownloadOutcome {
            descriptor: descriptor("Planning Comments"),
            status: OutcomeStatus::Downloaded {
                file_name: "24_01234_FUL-COMMENT-1.pdf".to_string(),
                bytes: 2048,
            },
        };
        assert!(downloaded.is_success());
        assert!(!downloaded.is_skipped());
        assert_eq!(downloaded.file_name(), Some("24_01234_FUL-COMMENT-1.pdf"));

        let skipped = DownloadOutcome {
            descriptor: descriptor("Planning Comments"),
            status: OutcomeStatus::Skipped {
                file_name: "24_01234_FUL-COMMENT-1.pdf".to_string(),
            },
        };
        assert!(skipped.is_success());
        assert!(skipped.is_skipped());

        let failed = DownloadOutcome {
            descriptor: descriptor("Planning Comments"),
            status: OutcomeStatus::Failed {
                reason: "all 3 attempts failed".to_string(),
            },
        };
        assert!(!failed.is_success());
        assert_eq!(failed.file_name(), None);
    }

    #[test]
    fn test_descriptor_serde_round_trip() {
        let doc = descriptor("Planning Comments");
        let json = serde_json::to_string(&doc).unwrap();
        let back: DocumentDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }
}
