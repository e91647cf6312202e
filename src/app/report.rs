//! Run metrics and final reporting
//!
//! Aggregates the outcome of a whole run into the numbers a user acts on:
//! how many documents were attempted, how many landed on disk, which
//! references failed, and how fast the run went.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::orchestrator::BatchReport;

/// Final statistics for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Tasks attempted in this batch window
    pub attempted: usize,
    /// Tasks that succeeded (downloaded or already on disk)
    pub succeeded: usize,
    /// Files satisfied from disk without a network call
    pub skipped_existing: usize,
    /// References of failed documents, for manual retry
    pub failed: Vec<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunReport {
    /// Build a report from a batch result and its timing
    pub fn from_batch(batch: &BatchReport, started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            attempted: batch.total(),
            succeeded: batch.succeeded(),
            skipped_existing: batch.skipped_existing(),
            failed: batch.failed_references(),
            started_at,
            elapsed,
        }
    }

    /// Throughput over the whole run
    pub fn documents_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 && self.attempted > 0 {
            self.attempted as f64 / secs
        } else {
            0.0
        }
    }

    /// Whether every task succeeded
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Human-readable multi-line summary
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Download complete: {}/{} succeeded ({} already on disk)",
            self.succeeded, self.attempted, self.skipped_existing
        )];
        lines.push(format!(
            "Elapsed: {:.2}s ({:.2} documents/second)",
            self.elapsed.as_secs_f64(),
            self.documents_per_second()
        ));
        if !self.failed.is_empty() {
            lines.push(format!("Failed to download {} documents:", self.failed.len()));
            for reference in &self.failed {
                lines.push(format!("  - {}", reference));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::models::{DocumentDescriptor, DownloadOutcome, OutcomeStatus};

    fn batch() -> BatchReport {
        let outcomes = vec![
            DownloadOutcome {
                descriptor: DocumentDescriptor::new("g-0", "ref 0", "t"),
                status: OutcomeStatus::Downloaded {
                    file_name: "ref 0.pdf".to_string(),
                    bytes: 100,
                },
            },
            DownloadOutcome {
                descriptor: DocumentDescriptor::new("g-1", "ref 1", "t"),
                status: OutcomeStatus::Skipped {
                    file_name: "ref 1.pdf".to_string(),
                },
            },
            DownloadOutcome {
                descriptor: DocumentDescriptor::new("g-2", "ref 2", "t"),
                status: OutcomeStatus::Failed {
                    reason: "all 3 attempts failed".to_string(),
                },
            },
        ];
        BatchReport { outcomes }
    }

    #[test]
    fn test_report_counts() {
        let report = RunReport::from_batch(&batch(), Utc::now(), Duration::from_secs(2));
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.failed, vec!["ref 2"]);
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_throughput() {
        let report = RunReport::from_batch(&batch(), Utc::now(), Duration::from_secs(2));
        assert!((report.documents_per_second() - 1.5).abs() < f64::EPSILON);

        let instant = RunReport::from_batch(&batch(), Utc::now(), Duration::ZERO);
        assert_eq!(instant.documents_per_second(), 0.0);
    }

    #[test]
    fn test_summary_lists_failed_references() {
        let report = RunReport::from_batch(&batch(), Utc::now(), Duration::from_secs(2));
        let summary = report.summary();
        assert!(summary.contains("2/3 succeeded"));
        assert!(summary.contains("1 already on disk"));
        assert!(summary.contains("  - ref 2"));
    }
}
