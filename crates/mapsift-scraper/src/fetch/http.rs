//! `reqwest`-backed [`Fetcher`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{Fetcher, Page};
use crate::error::ScraperError;
use crate::proxy::ProxyHandle;

/// Plain HTTP transport with browser-like request headers.
///
/// One `reqwest::Client` is kept per proxy URL, built lazily on first use.
pub struct HttpFetcher {
    user_agent: String,
    timeout: Duration,
    direct: Client,
    proxied: Mutex<HashMap<String, Client>>,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, ScraperError> {
        let timeout = Duration::from_secs(timeout_secs);
        let direct = build_client(user_agent, timeout, None)?;
        Ok(Self {
            user_agent: user_agent.to_owned(),
            timeout,
            direct,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, proxy: Option<&ProxyHandle>) -> Result<Client, ScraperError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut clients = self
            .proxied
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(client) = clients.get(proxy.url()) {
            return Ok(client.clone());
        }

        let client = build_client(&self.user_agent, self.timeout, Some(proxy))?;
        clients.insert(proxy.url().to_owned(), client.clone());
        Ok(client)
    }
}

fn build_client(
    user_agent: &str,
    timeout: Duration,
    proxy: Option<&ProxyHandle>,
) -> Result<Client, ScraperError> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy.url()).map_err(|e| ScraperError::InvalidUrl {
            url: proxy.to_string(),
            reason: e.to_string(),
        })?;
        builder = builder.proxy(proxy);
    }
    Ok(builder.build()?)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, proxy: Option<&ProxyHandle>) -> Result<Page, ScraperError> {
        let client = self.client_for(proxy)?;
        let response = client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ScraperError::EmptyBody {
                url: url.to_owned(),
            });
        }

        Ok(Page::new(final_url, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_client_per_proxy() {
        let fetcher = HttpFetcher::new("mapsift-test/0.1", 5).unwrap();
        let proxy = ProxyHandle::new("http://127.0.0.1:3128");
        fetcher.client_for(Some(&proxy)).unwrap();
        fetcher.client_for(Some(&proxy)).unwrap();
        assert_eq!(fetcher.proxied.lock().unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_proxy_url() {
        let fetcher = HttpFetcher::new("mapsift-test/0.1", 5).unwrap();
        let proxy = ProxyHandle::new("not a proxy url");
        let err = fetcher.client_for(Some(&proxy)).unwrap_err();
        assert!(
            matches!(err, ScraperError::InvalidUrl { .. }),
            "expected InvalidUrl, got: {err:?}"
        );
    }
}
