//! Download orchestration
//!
//! The orchestrator turns an ordered descriptor list into one outcome per
//! document. Every task follows the same algorithm — derive the filename,
//! skip if the file is already on disk, otherwise fetch and save — in one of
//! two execution modes: strictly sequential with a politeness delay between
//! tasks, or fanned out across a bounded pool of workers where the
//! concurrency limit itself provides the politeness.
//!
//! A failed document never aborts the batch; failures surface as outcomes
//! carrying the human-readable reference so they can be retried manually.
//! Because a file that exists on disk is never re-fetched, an interrupted run
//! can simply be re-run and picks up where it left off.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::app::client::DocumentFetcher;
use crate::app::filename::sanitize_reference;
use crate::app::models::{DocumentDescriptor, DownloadOutcome, DownloadTask, OutcomeStatus};
use crate::constants::{files, limits, workers};
use crate::errors::{FetchError, Result};

/// How the orchestrator schedules its tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One task at a time, in input order
    Sequential,
    /// Bounded worker pool, outcomes collected as they complete
    Concurrent,
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory downloaded documents are written to
    pub destination: PathBuf,
    /// Worker pool size for concurrent mode
    pub worker_count: usize,
    /// Politeness delay between requests
    pub request_delay: Duration,
    /// Uniform jitter factor range applied to the request delay
    pub jitter: (f64, f64),
    /// Whether the sequential delay also applies to tasks skipped via the
    /// existence check
    pub delay_on_skip: bool,
    /// Whether the jitter delay also applies in concurrent mode; off by
    /// default since the worker bound already paces the portal
    pub delay_in_concurrent: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(files::DEFAULT_DOWNLOAD_DIR),
            worker_count: workers::DEFAULT_WORKER_COUNT,
            request_delay: limits::REQUEST_DELAY,
            jitter: (limits::JITTER_MIN, limits::JITTER_MAX),
            delay_on_skip: false,
            delay_in_concurrent: false,
        }
    }
}

/// Progress snapshot emitted after every finished task
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Tasks finished so far (any outcome)
    pub completed: usize,
    /// Total tasks in this batch
    pub total: usize,
    /// Running success count (downloaded + skipped)
    pub succeeded: usize,
    /// Reference of the task that just finished
    pub reference: String,
    /// Whether that task succeeded
    pub success: bool,
}

/// Collected result of one batch
#[derive(Debug)]
pub struct BatchReport {
    /// One outcome per input descriptor
    pub outcomes: Vec<DownloadOutcome>,
}

impl BatchReport {
    /// Total tasks processed
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Tasks that ended in success, including skips
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Distinct already-existing files satisfied without a network call
    pub fn skipped_existing(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// References of failed documents, enough to retry manually
    pub fn failed_references(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.descriptor.reference.clone())
            .collect()
    }
}

/// Schedules per-document fetch-and-save tasks
#[derive(Clone)]
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn DocumentFetcher>,
    config: Arc<OrchestratorConfig>,
}

impl DownloadOrchestrator {
    /// Create an orchestrator over the given fetcher
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: OrchestratorConfig) -> Self {
        Self {
            fetcher,
            config: Arc::new(config),
        }
    }

    /// Process every descriptor, producing exactly one outcome per input
    ///
    /// `progress` receives a snapshot after each finished task; a full or
    /// closed channel never blocks the run.
    pub async fn run(
        &self,
        documents: &[DocumentDescriptor],
        mode: ExecutionMode,
        progress: Option<mpsc::Sender<ProgressUpdate>>,
    ) -> Result<BatchReport> {
        tokio::fs::create_dir_all(&self.config.destination).await?;

        let report = match mode {
            ExecutionMode::Sequential => self.run_sequential(documents, progress).await,
            ExecutionMode::Concurrent => self.run_concurrent(documents, progress).await,
        };

        info!(
            "Batch finished: {}/{} succeeded ({} already on disk)",
            report.succeeded(),
            report.total(),
            report.skipped_existing()
        );
        Ok(report)
    }

    async fn run_sequential(
        &self,
        documents: &[DocumentDescriptor],
        progress: Option<mpsc::Sender<ProgressUpdate>>,
    ) -> BatchReport {
        let total = documents.len();
        let mut tracker = ProgressTracker::new(total, progress);
        let mut outcomes = Vec::with_capacity(total);

        for (index, descriptor) in documents.iter().enumerate() {
            debug!(
                "Processing {}/{}: {}",
                index + 1,
                total,
                descriptor.reference
            );
            let outcome = self.process_task(descriptor, true).await;
            tracker.record(&outcome);
            outcomes.push(outcome);
        }

        BatchReport { outcomes }
    }

    async fn run_concurrent(
        &self,
        documents: &[DocumentDescriptor],
        progress: Option<mpsc::Sender<ProgressUpdate>>,
    ) -> BatchReport {
        let total = documents.len();
        let semaphore = Arc::new(Semaphore::new(self.config.worker_count.max(1)));
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<DownloadOutcome>(total.max(1));

        for descriptor in documents.iter().cloned() {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let outcome_tx = outcome_tx.clone();
            let apply_delay = self.config.delay_in_concurrent;

            tokio::spawn(async move {
                // Admission control: at most worker_count tasks past this
                // point at any moment.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("worker semaphore closed");
                let outcome = orchestrator.process_task(&descriptor, apply_delay).await;
                let _ = outcome_tx.send(outcome).await;
            });
        }
        drop(outcome_tx);

        let mut tracker = ProgressTracker::new(total, progress);
        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = outcome_rx.recv().await {
            tracker.record(&outcome);
            outcomes.push(outcome);
        }

        BatchReport { outcomes }
    }

    /// Run the per-task algorithm for one descriptor
    async fn process_task(
        &self,
        descriptor: &DocumentDescriptor,
        apply_delay: bool,
    ) -> DownloadOutcome {
        let task = DownloadTask {
            descriptor: descriptor.clone(),
            target: self
                .config
                .destination
                .join(sanitize_reference(&descriptor.reference)),
        };
        let file_name = task
            .target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| sanitize_reference(&descriptor.reference));

        // Idempotent resume: a file already on disk is a success with no
        // network call, across runs and across overlapping batches.
        if task.target.exists() {
            debug!("File already exists, skipping: {}", file_name);
            if apply_delay && self.config.delay_on_skip {
                self.politeness_delay().await;
            }
            return DownloadOutcome {
                descriptor: descriptor.clone(),
                status: OutcomeStatus::Skipped { file_name },
            };
        }

        if apply_delay {
            self.politeness_delay().await;
        }

        match self.fetcher.fetch_document(descriptor, &task.target).await {
            Ok(bytes) => DownloadOutcome {
                descriptor: descriptor.clone(),
                status: OutcomeStatus::Downloaded { file_name, bytes },
            },
            Err(e) => {
                warn!("Failed to download {}: {}", descriptor.reference, e);
                DownloadOutcome {
                    descriptor: descriptor.clone(),
                    status: OutcomeStatus::Failed {
                        reason: failure_reason(&e),
                    },
                }
            }
        }
    }

    /// Sleep a randomized fraction of the configured request delay
    async fn politeness_delay(&self) {
        let (low, high) = self.config.jitter;
        let factor = if high > low {
            rand::thread_rng().gen_range(low..high)
        } else {
            low
        };
        let delay = self.config.request_delay.mul_f64(factor.max(0.0));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Running completed/succeeded counters plus the optional progress channel
struct ProgressTracker {
    total: usize,
    completed: usize,
    succeeded: usize,
    channel: Option<mpsc::Sender<ProgressUpdate>>,
}

impl ProgressTracker {
    fn new(total: usize, channel: Option<mpsc::Sender<ProgressUpdate>>) -> Self {
        Self {
            total,
            completed: 0,
            succeeded: 0,
            channel,
        }
    }

    fn record(&mut self, outcome: &DownloadOutcome) {
        self.completed += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        }
        if let Some(channel) = &self.channel {
            // Progress is advisory; a slow consumer must not stall downloads.
            let _ = channel.try_send(ProgressUpdate {
                completed: self.completed,
                total: self.total,
                succeeded: self.succeeded,
                reference: outcome.descriptor.reference.clone(),
                success: outcome.is_success(),
            });
        }
    }
}

fn failure_reason(error: &FetchError) -> String {
    match error {
        FetchError::RetriesExhausted { attempts, last } => {
            format!("all {} attempts failed: {}", attempts, last)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::errors::FetchResult;

    /// Fetcher double that records call and in-flight counts
    struct MockFetcher {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_ids: HashSet<String>,
        work_duration: Duration,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self::failing([])
        }

        fn failing(ids: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                fail_ids: ids.into_iter().map(String::from).collect(),
                work_duration: Duration::ZERO,
            }
        }

        fn slow(duration: Duration) -> Self {
            Self {
                work_duration: duration,
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentFetcher for MockFetcher {
        async fn fetch_document(
            &self,
            descriptor: &DocumentDescriptor,
            target: &Path,
        ) -> FetchResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if !self.work_duration.is_zero() {
                tokio::time::sleep(self.work_duration).await;
            }

            let result = if self.fail_ids.contains(&descriptor.id) {
                Err(FetchError::RetriesExhausted {
                    attempts: 3,
                    last: Box::new(FetchError::Status {
                        status: 404,
                        url: descriptor.id.clone(),
                    }),
                })
            } else {
                tokio::fs::write(target, b"pdf")
                    .await
                    .map(|_| 3)
                    .map_err(|source| FetchError::Io {
                        path: target.to_path_buf(),
                        source,
                    })
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn documents(count: usize) -> Vec<DocumentDescriptor> {
        (0..count)
            .map(|i| {
                DocumentDescriptor::new(
                    format!("guid-{}", i),
                    format!("24/0001 comment {}", i),
                    "Planning Comments",
                )
            })
            .collect()
    }

    fn orchestrator_in(
        dir: &TempDir,
        fetcher: Arc<MockFetcher>,
        worker_count: usize,
    ) -> DownloadOrchestrator {
        DownloadOrchestrator::new(
            fetcher,
            OrchestratorConfig {
                destination: dir.path().to_path_buf(),
                worker_count,
                request_delay: Duration::ZERO,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_sequential_produces_outcomes_in_input_order() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = orchestrator_in(&dir, fetcher.clone(), 1);
        let docs = documents(5);

        let report = orchestrator
            .run(&docs, ExecutionMode::Sequential, None)
            .await
            .unwrap();

        assert_eq!(report.total(), 5);
        assert_eq!(report.succeeded(), 5);
        let order: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| o.descriptor.id.as_str())
            .collect();
        assert_eq!(order, vec!["guid-0", "guid-1", "guid-2", "guid-3", "guid-4"]);
    }

    #[tokio::test]
    async fn test_concurrent_yields_exactly_one_outcome_per_task() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_millis(5)));
        let orchestrator = orchestrator_in(&dir, fetcher.clone(), 4);
        let docs = documents(12);

        let report = orchestrator
            .run(&docs, ExecutionMode::Concurrent, None)
            .await
            .unwrap();

        assert_eq!(report.total(), 12);
        let ids: HashSet<_> = report
            .outcomes
            .iter()
            .map(|o| o.descriptor.id.clone())
            .collect();
        assert_eq!(ids.len(), 12);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_worker_count() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_millis(20)));
        let orchestrator = orchestrator_in(&dir, fetcher.clone(), 3);
        let docs = documents(10);

        orchestrator
            .run(&docs, ExecutionMode::Concurrent, None)
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), 10);
        assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_idempotent_resume_makes_no_network_calls() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = orchestrator_in(&dir, fetcher.clone(), 4);
        let docs = documents(6);

        let first = orchestrator
            .run(&docs, ExecutionMode::Concurrent, None)
            .await
            .unwrap();
        assert_eq!(first.succeeded(), 6);
        assert_eq!(fetcher.calls(), 6);

        let second = orchestrator
            .run(&docs, ExecutionMode::Concurrent, None)
            .await
            .unwrap();
        assert_eq!(second.succeeded(), first.succeeded());
        assert_eq!(second.skipped_existing(), 6);
        // No additional fetches on the second run.
        assert_eq!(fetcher.calls(), 6);
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::failing(["guid-3"]));
        let orchestrator = orchestrator_in(&dir, fetcher.clone(), 4);
        let docs = documents(7);

        let report = orchestrator
            .run(&docs, ExecutionMode::Concurrent, None)
            .await
            .unwrap();

        assert_eq!(report.total(), 7);
        assert_eq!(report.succeeded(), 6);
        assert_eq!(report.failed_references(), vec!["24/0001 comment 3"]);
    }

    #[tokio::test]
    async fn test_partially_downloaded_directory_resumes() {
        let dir = TempDir::new().unwrap();
        let docs = documents(4);

        // Two documents already present from an earlier run.
        for descriptor in &docs[..2] {
            std::fs::write(
                dir.path().join(sanitize_reference(&descriptor.reference)),
                b"old",
            )
            .unwrap();
        }

        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = orchestrator_in(&dir, fetcher.clone(), 2);
        let report = orchestrator
            .run(&docs, ExecutionMode::Sequential, None)
            .await
            .unwrap();

        assert_eq!(report.skipped_existing(), 2);
        assert_eq!(fetcher.calls(), 2);
        // Existing files are never overwritten.
        assert_eq!(
            std::fs::read(dir.path().join(sanitize_reference(&docs[0].reference))).unwrap(),
            b"old"
        );
    }

    #[tokio::test]
    async fn test_progress_updates_reach_channel() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::failing(["guid-1"]));
        let orchestrator = orchestrator_in(&dir, fetcher, 2);
        let docs = documents(3);

        let (tx, mut rx) = mpsc::channel(16);
        let report = orchestrator
            .run(&docs, ExecutionMode::Concurrent, Some(tx))
            .await
            .unwrap();
        assert_eq!(report.succeeded(), 2);

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        assert_eq!(updates.len(), 3);
        let last = updates.last().unwrap();
        assert_eq!(last.completed, 3);
        assert_eq!(last.total, 3);
        assert_eq!(last.succeeded, 2);
        // Completed counts are monotonic even with unordered completion.
        for pair in updates.windows(2) {
            assert!(pair[1].completed == pair[0].completed + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_delay_applies_between_downloads() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = DownloadOrchestrator::new(
            fetcher,
            OrchestratorConfig {
                destination: dir.path().to_path_buf(),
                request_delay: Duration::from_secs(1),
                jitter: (1.0, 1.0),
                ..Default::default()
            },
        );
        let docs = documents(3);

        let start = tokio::time::Instant::now();
        orchestrator
            .run(&docs, ExecutionMode::Sequential, None)
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_files_bypass_delay_by_default() {
        let dir = TempDir::new().unwrap();
        let docs = documents(3);
        for descriptor in &docs {
            std::fs::write(
                dir.path().join(sanitize_reference(&descriptor.reference)),
                b"x",
            )
            .unwrap();
        }

        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = DownloadOrchestrator::new(
            fetcher.clone(),
            OrchestratorConfig {
                destination: dir.path().to_path_buf(),
                request_delay: Duration::from_secs(1),
                jitter: (1.0, 1.0),
                delay_on_skip: false,
                ..Default::default()
            },
        );

        let start = tokio::time::Instant::now();
        let report = orchestrator
            .run(&docs, ExecutionMode::Sequential, None)
            .await
            .unwrap();
        assert_eq!(report.skipped_existing(), 3);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_on_skip_when_configured() {
        let dir = TempDir::new().unwrap();
        let docs = documents(2);
        for descriptor in &docs {
            std::fs::write(
                dir.path().join(sanitize_reference(&descriptor.reference)),
                b"x",
            )
            .unwrap();
        }

        let orchestrator = DownloadOrchestrator::new(
            Arc::new(MockFetcher::new()),
            OrchestratorConfig {
                destination: dir.path().to_path_buf(),
                request_delay: Duration::from_secs(1),
                jitter: (1.0, 1.0),
                delay_on_skip: true,
                ..Default::default()
            },
        );

        let start = tokio::time::Instant::now();
        orchestrator
            .run(&docs, ExecutionMode::Sequential, None)
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator_in(&dir, Arc::new(MockFetcher::new()), 4);
        let report = orchestrator
            .run(&[], ExecutionMode::Concurrent, None)
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(report.succeeded(), 0);
    }
}
