//! Retry with exponential backoff
//!
//! Retrying is expressed as an explicit state machine over an attempt counter
//! and the last error, with `RetriesExhausted` as the terminal failure state.
//! Callers get a typed result back; giving up is never signalled by a bare
//! propagated transport error.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::{FetchError, FetchResult};

/// Bounded-attempt backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (not retries); always at least 1
    pub attempts: u32,
    /// Attempt `n` (counted from 0) waits `base_delay * 2^n` before attempt `n+1`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy, clamping attempts to at least one
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Backoff delay after the given zero-based attempt
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `operation` under the policy, backing off between failed attempts
///
/// Each attempt receives its zero-based index. Non-retryable errors (disk
/// I/O, bad URLs) propagate immediately; retryable ones are retried until the
/// attempt budget is spent, at which point the last error is wrapped in
/// [`FetchError::RetriesExhausted`].
pub async fn run<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> FetchResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = FetchResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt + 1 < policy.attempts => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    "Attempt {}/{} failed, retrying in {:?}: {}",
                    attempt + 1,
                    policy.attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(FetchError::RetriesExhausted {
                    attempts: policy.attempts,
                    last: Box::new(e),
                })
            }
        }
    }
}
