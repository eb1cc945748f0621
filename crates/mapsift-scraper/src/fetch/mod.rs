//! Page fetching: the transport seam, the default HTTP transport, and the
//! retry/proxy-feedback wrapper around it.

mod http;
mod resilient;

pub use http::HttpFetcher;
pub use resilient::ResilientFetcher;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::ScraperError;
use crate::proxy::ProxyHandle;

/// A fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    url: String,
    html: String,
}

impl Page {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw markup as received.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Outer HTML of every element matching `selector`, in document order.
    #[must_use]
    pub fn select(&self, selector: &Selector) -> Vec<String> {
        select_outer_html(&self.html, selector)
    }
}

/// Parses `html` and returns the outer HTML of every element matching
/// `selector`.
pub(crate) fn select_outer_html(html: &str, selector: &Selector) -> Vec<String> {
    Html::parse_document(html)
        .select(selector)
        .map(|element| element.html())
        .collect()
}

/// Network transport for a single page.
///
/// Implementations perform exactly one request per call. Retries, rate
/// limiting, and proxy feedback are layered on by [`ResilientFetcher`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, proxy: Option<&ProxyHandle>) -> Result<Page, ScraperError>;
}
