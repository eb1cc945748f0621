//! Outbound request spacing.
//!
//! Every fetch attempt waits on a [`RateGate`] first. The wait is not an
//! attempt and never counts against the retry budget.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Suspends the caller until it may issue the next fetch.
#[async_trait]
pub trait RateGate: Send + Sync {
    async fn await_slot(&self);
}

/// Grants slots no closer together than `min_interval`, in arrival order.
///
/// The first slot is granted immediately. Safe to share across concurrent
/// callers: each caller reserves the next free slot under the lock and then
/// sleeps outside it.
#[derive(Debug)]
pub struct IntervalRateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl IntervalRateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// `requests` slots per `window`. A zero `requests` disables spacing.
    #[must_use]
    pub fn per_window(requests: u32, window: Duration) -> Self {
        if requests == 0 {
            return Self::new(Duration::ZERO);
        }
        Self::new(window / requests)
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserves the next slot and returns the instant it opens.
    async fn reserve(&self) -> Instant {
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock().await;
        let slot = match *next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        *next_slot = Some(slot + self.min_interval);
        slot
    }
}

#[async_trait]
impl RateGate for IntervalRateLimiter {
    async fn await_slot(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let slot = self.reserve().await;
        if slot > Instant::now() {
            tracing::trace!(
                wait_ms = u64::try_from(slot.saturating_duration_since(Instant::now()).as_millis())
                    .unwrap_or(u64::MAX),
                "waiting for rate limit slot"
            );
            tokio::time::sleep_until(slot).await;
        }
    }
}
