//! Bounded retry with growing backoff for single network operations.
//!
//! Retry is scoped to one fetch. Nothing in this crate retries a whole batch.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` came out of a network attempt and the attempt is
/// worth repeating.
///
/// Not retriable:
/// - [`ScraperError::InvalidUrl`]: the same URL would be rejected again.
/// - [`ScraperError::Http`] raised while building the request, e.g. an
///   unparseable link. No request was sent.
/// - [`ScraperError::Cancelled`]: the caller asked us to stop.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::InvalidUrl { .. } | ScraperError::Cancelled => false,
        ScraperError::Http(source) => !source.is_builder(),
        _ => true,
    }
}

/// Attempt count and backoff for one wrapped fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// The wait after failed attempt `n` (1-based) is `base_delay * n`.
    pub base_delay: Duration,
    /// Deadline for a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(3),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Executes `operation` up to `policy.max_attempts` times.
///
/// # Backoff schedule (`base_delay = 3s`, `max_attempts = 3`)
///
/// | Attempt | Sleep after failure |
/// |---------|---------------------|
/// | 1       | 3 s                 |
/// | 2       | 6 s                 |
/// | 3       | (none, error returned) |
///
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_attempts {
            return Err(err);
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "fetch failed, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
