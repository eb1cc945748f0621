use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::proxy::{ProxyHandle, RotatingProxyPool};

/// Replays a fixed script of outcomes, one per call.
struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Page, ScraperError>>>,
    calls: AtomicU32,
    seen_proxies: Mutex<Vec<Option<String>>>,
}

impl ScriptedFetcher {
    fn new(script: Vec<Result<Page, ScraperError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
            seen_proxies: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, proxy: Option<&ProxyHandle>) -> Result<Page, ScraperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_proxies
            .lock()
            .unwrap()
            .push(proxy.map(|p| p.url().to_owned()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable(url)))
    }
}

/// Never answers; used to exercise the per-attempt timeout.
struct HangingFetcher;

#[async_trait]
impl Fetcher for HangingFetcher {
    async fn fetch(&self, _url: &str, _proxy: Option<&ProxyHandle>) -> Result<Page, ScraperError> {
        std::future::pending().await
    }
}

#[derive(Default)]
struct RecordingProxies {
    successes: AtomicU32,
    failures: AtomicU32,
}

impl ProxyProvider for RecordingProxies {
    fn get_proxy(&self) -> Option<ProxyHandle> {
        Some(ProxyHandle::new("http://proxy.test:8080"))
    }

    fn report_success(&self, _proxy: &ProxyHandle) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn report_failure(&self, _proxy: &ProxyHandle) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingGate {
    slots: AtomicU32,
}

#[async_trait]
impl RateGate for CountingGate {
    async fn await_slot(&self) {
        self.slots.fetch_add(1, Ordering::SeqCst);
    }
}

fn unavailable(url: &str) -> ScraperError {
    ScraperError::UnexpectedStatus {
        status: 503,
        url: url.to_owned(),
    }
}

fn ok_page() -> Result<Page, ScraperError> {
    Ok(Page::new("https://example.com/maps", "<html>ok</html>"))
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::ZERO,
        attempt_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn returns_page_on_first_success() {
    let wrapper = ResilientFetcher::new(ScriptedFetcher::new(vec![ok_page()])).with_policy(fast_policy());
    let page = wrapper.fetch("https://example.com/maps").await.unwrap();
    assert_eq!(page.html(), "<html>ok</html>");
    assert_eq!(wrapper.fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retries_transient_failures_and_gates_every_attempt() {
    let gate = Arc::new(CountingGate::default());
    let fetcher = ScriptedFetcher::new(vec![
        Err(unavailable("u")),
        Err(unavailable("u")),
        ok_page(),
    ]);
    let wrapper = ResilientFetcher::new(fetcher)
        .with_policy(fast_policy())
        .with_rate_gate(gate.clone());

    assert!(wrapper.fetch("https://example.com/maps").await.is_ok());
    assert_eq!(wrapper.fetcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(gate.slots.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn surfaces_error_after_three_attempts_with_backoff() {
    let wrapper = ResilientFetcher::new(ScriptedFetcher::new(vec![])).with_policy(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(3),
        attempt_timeout: Duration::from_secs(30),
    });

    let started = tokio::time::Instant::now();
    let err = wrapper.fetch("https://example.com/maps").await.unwrap_err();

    assert!(matches!(err, ScraperError::UnexpectedStatus { status: 503, .. }));
    assert_eq!(wrapper.fetcher.calls.load(Ordering::SeqCst), 3);
    assert!(
        started.elapsed() >= Duration::from_secs(9),
        "expected at least 3s + 6s of backoff, got {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn reports_success_once_to_proxy_provider() {
    let proxies = Arc::new(RecordingProxies::default());
    let fetcher = ScriptedFetcher::new(vec![Err(unavailable("u")), ok_page()]);
    let wrapper = ResilientFetcher::new(fetcher)
        .with_policy(fast_policy())
        .with_proxies(proxies.clone());

    wrapper.fetch("https://example.com/maps").await.unwrap();

    assert_eq!(proxies.successes.load(Ordering::SeqCst), 1);
    assert_eq!(proxies.failures.load(Ordering::SeqCst), 0);
    let seen = wrapper.fetcher.seen_proxies.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            Some("http://proxy.test:8080".to_owned()),
            Some("http://proxy.test:8080".to_owned())
        ]
    );
}

#[tokio::test]
async fn reports_failure_once_after_budget_is_spent() {
    let proxies = Arc::new(RecordingProxies::default());
    let wrapper = ResilientFetcher::new(ScriptedFetcher::new(vec![]))
        .with_policy(fast_policy())
        .with_proxies(proxies.clone());

    assert!(wrapper.fetch("https://example.com/maps").await.is_err());
    assert_eq!(proxies.successes.load(Ordering::SeqCst), 0);
    assert_eq!(proxies.failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn proceeds_without_proxy() {
    let pool = Arc::new(RotatingProxyPool::new(Vec::<String>::new()));
    let wrapper = ResilientFetcher::new(ScriptedFetcher::new(vec![ok_page()]))
        .with_policy(fast_policy())
        .with_proxies(pool);

    assert!(wrapper.fetch("https://example.com/maps").await.is_ok());
    assert_eq!(*wrapper.fetcher.seen_proxies.lock().unwrap(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn hung_attempt_times_out_and_is_retried() {
    let wrapper = ResilientFetcher::new(HangingFetcher).with_policy(RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::ZERO,
        attempt_timeout: Duration::from_secs(2),
    });

    let started = tokio::time::Instant::now();
    let err = wrapper.fetch("https://example.com/maps").await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Timeout { timeout_secs: 2, .. }),
        "expected Timeout, got: {err:?}"
    );
    assert!(started.elapsed() >= Duration::from_secs(4));
}
