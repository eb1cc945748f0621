//! Retry, rate-limit, and proxy-feedback wrapper around a [`Fetcher`].

use std::sync::Arc;

use super::{Fetcher, Page};
use crate::error::ScraperError;
use crate::proxy::{NoProxy, ProxyProvider};
use crate::rate_limit::{IntervalRateLimiter, RateGate};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Performs one logical fetch: a proxy is selected once, then up to
/// `policy.max_attempts` attempts are made, each preceded by a rate-limit
/// slot and bounded by `policy.attempt_timeout`.
///
/// Proxy health is reported once per logical fetch: success if any attempt
/// succeeded, failure if the retry budget ran out. Reporting never changes
/// the returned value.
pub struct ResilientFetcher<F> {
    fetcher: F,
    proxies: Arc<dyn ProxyProvider>,
    gate: Arc<dyn RateGate>,
    policy: RetryPolicy,
}

impl<F: Fetcher> ResilientFetcher<F> {
    /// Wraps `fetcher` with the default policy, no proxies, and no spacing.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            proxies: Arc::new(NoProxy),
            gate: Arc::new(IntervalRateLimiter::new(std::time::Duration::ZERO)),
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_proxies(mut self, proxies: Arc<dyn ProxyProvider>) -> Self {
        self.proxies = proxies;
        self
    }

    #[must_use]
    pub fn with_rate_gate(mut self, gate: Arc<dyn RateGate>) -> Self {
        self.gate = gate;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches `url`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once the retry budget is spent,
    /// or the first non-retriable error.
    pub async fn fetch(&self, url: &str) -> Result<Page, ScraperError> {
        let proxy = self.proxies.get_proxy();
        if proxy.is_none() {
            tracing::warn!(url, "no proxy configured, fetching unproxied");
        }

        let policy = self.policy;
        let fetcher = &self.fetcher;
        let gate = &self.gate;
        let proxy_ref = proxy.as_ref();

        let result = retry_with_backoff(policy, move |attempt| async move {
            gate.await_slot().await;
            tracing::debug!(url, attempt, "fetching page");
            match tokio::time::timeout(policy.attempt_timeout, fetcher.fetch(url, proxy_ref))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ScraperError::Timeout {
                    url: url.to_owned(),
                    timeout_secs: policy.attempt_timeout.as_secs(),
                }),
            }
        })
        .await;

        if let Some(proxy) = &proxy {
            match &result {
                Ok(_) => self.proxies.report_success(proxy),
                Err(err) => {
                    tracing::warn!(url, %proxy, error = %err, "fetch failed through proxy");
                    self.proxies.report_failure(proxy);
                }
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "resilient_test.rs"]
mod tests;
