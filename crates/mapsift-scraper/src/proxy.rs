//! Proxy selection and health feedback.

use std::fmt;
use std::sync::Mutex;

use mapsift_core::app_config::redact_proxy_url;

/// Consecutive failures after which a proxy is skipped by rotation.
const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// An opaque, already-selected proxy.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyHandle {
    url: String,
}

impl ProxyHandle {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyHandle")
            .field(&redact_proxy_url(&self.url))
            .finish()
    }
}

impl fmt::Display for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact_proxy_url(&self.url))
    }
}

/// Hands out proxies and receives fire-and-forget health reports.
///
/// Implementations must tolerate concurrent calls and must not panic.
pub trait ProxyProvider: Send + Sync {
    fn get_proxy(&self) -> Option<ProxyHandle>;
    fn report_success(&self, proxy: &ProxyHandle);
    fn report_failure(&self, proxy: &ProxyHandle);
}

/// Provider for running without proxies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProxy;

impl ProxyProvider for NoProxy {
    fn get_proxy(&self) -> Option<ProxyHandle> {
        None
    }

    fn report_success(&self, _proxy: &ProxyHandle) {}

    fn report_failure(&self, _proxy: &ProxyHandle) {}
}

#[derive(Debug)]
struct PoolState {
    cursor: usize,
    consecutive_failures: Vec<u32>,
}

/// Round-robin pool that skips proxies with too many consecutive failures.
///
/// When every proxy is over the threshold the counters are reset and
/// rotation starts over, so a configured pool never degrades to "no proxy".
#[derive(Debug)]
pub struct RotatingProxyPool {
    proxies: Vec<ProxyHandle>,
    max_consecutive_failures: u32,
    state: Mutex<PoolState>,
}

impl RotatingProxyPool {
    #[must_use]
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let proxies: Vec<ProxyHandle> = urls.into_iter().map(ProxyHandle::new).collect();
        let consecutive_failures = vec![0; proxies.len()];
        Self {
            proxies,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            state: Mutex::new(PoolState {
                cursor: 0,
                consecutive_failures,
            }),
        }
    }

    #[must_use]
    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max.max(1);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    fn position(&self, proxy: &ProxyHandle) -> Option<usize> {
        self.proxies.iter().position(|p| p == proxy)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState> {
        // A panic while holding the lock cannot leave the counters in an
        // invalid state, so a poisoned guard is still usable.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ProxyProvider for RotatingProxyPool {
    fn get_proxy(&self) -> Option<ProxyHandle> {
        if self.proxies.is_empty() {
            return None;
        }
        let mut state = self.lock();
        let len = self.proxies.len();

        let healthy = (0..len)
            .map(|offset| (state.cursor + offset) % len)
            .find(|&idx| state.consecutive_failures[idx] < self.max_consecutive_failures);

        let idx = if let Some(idx) = healthy {
            idx
        } else {
            tracing::warn!(
                proxies = len,
                "all proxies over failure threshold, resetting pool"
            );
            state.consecutive_failures.iter_mut().for_each(|f| *f = 0);
            state.cursor % len
        };

        state.cursor = (idx + 1) % len;
        Some(self.proxies[idx].clone())
    }

    fn report_success(&self, proxy: &ProxyHandle) {
        if let Some(idx) = self.position(proxy) {
            self.lock().consecutive_failures[idx] = 0;
        }
    }

    fn report_failure(&self, proxy: &ProxyHandle) {
        if let Some(idx) = self.position(proxy) {
            let mut state = self.lock();
            state.consecutive_failures[idx] = state.consecutive_failures[idx].saturating_add(1);
        }
    }
}
