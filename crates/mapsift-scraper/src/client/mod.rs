//! The scrape entry point: search fetch, place extraction, review
//! enrichment.

mod urls;

pub use urls::{build_review_url, build_search_url, resolve_link};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mapsift_core::{AppConfig, PlaceRecord, ReviewRecord, SearchRequest};
use tokio_util::sync::CancellationToken;

use crate::enrich::{enrich_places, ReviewSource, DEFAULT_GROUP_SIZE};
use crate::error::ScraperError;
use crate::extract::MarkupRules;
use crate::fetch::{Fetcher, HttpFetcher, ResilientFetcher};
use crate::pipeline::{extract_places, extract_reviews, ExtractionObserver, TracingObserver};
use crate::proxy::{NoProxy, ProxyProvider, RotatingProxyPool};
use crate::rate_limit::IntervalRateLimiter;
use crate::retry::RetryPolicy;

/// Scrapes place listings, and optionally their reviews, for one request
/// at a time.
pub struct PlaceScraper<F> {
    fetcher: ResilientFetcher<F>,
    base_url: String,
    rules: MarkupRules,
    group_size: usize,
    observer: Arc<dyn ExtractionObserver>,
}

impl PlaceScraper<HttpFetcher> {
    /// Builds a scraper with the HTTP transport and the collaborators
    /// described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let http = HttpFetcher::new(&config.user_agent, config.request_timeout_secs)?;
        let proxies: Arc<dyn ProxyProvider> = if config.proxy_urls.is_empty() {
            Arc::new(NoProxy)
        } else {
            Arc::new(RotatingProxyPool::new(config.proxy_urls.iter().cloned()))
        };
        let gate = IntervalRateLimiter::per_window(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            attempt_timeout: Duration::from_secs(config.request_timeout_secs),
        };

        let fetcher = ResilientFetcher::new(http)
            .with_proxies(proxies)
            .with_rate_gate(Arc::new(gate))
            .with_policy(policy);
        Ok(Self::new(fetcher, &config.base_url).with_group_size(config.enrich_group_size))
    }
}

impl<F: Fetcher> PlaceScraper<F> {
    #[must_use]
    pub fn new(fetcher: ResilientFetcher<F>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_owned(),
            rules: MarkupRules::default(),
            group_size: DEFAULT_GROUP_SIZE,
            observer: Arc::new(TracingObserver),
        }
    }

    #[must_use]
    pub fn with_markup_rules(mut self, rules: MarkupRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size.max(1);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs `request` to completion.
    ///
    /// # Errors
    ///
    /// A failed search page fetch is fatal and returned as is. Review
    /// failures only shorten the result.
    pub async fn scrape(&self, request: &SearchRequest) -> Result<Vec<PlaceRecord>, ScraperError> {
        self.scrape_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`Self::scrape`], stopping early when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Everything [`Self::scrape`] returns, plus [`ScraperError::Cancelled`].
    pub async fn scrape_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlaceRecord>, ScraperError> {
        if cancel.is_cancelled() {
            return Err(ScraperError::Cancelled);
        }

        let url = build_search_url(&self.base_url, request);
        tracing::info!(
            query = request.search_query(),
            max_results = request.max_results(),
            include_reviews = request.include_reviews(),
            "starting scrape"
        );

        let page = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ScraperError::Cancelled),
            page = self.fetcher.fetch(&url) => page?,
        };

        let max_results = usize::try_from(request.max_results()).unwrap_or(usize::MAX);
        let mut places =
            extract_places(page.html(), &self.rules, max_results, self.observer.as_ref()).records;
        for place in &mut places {
            if !place.share_link.is_empty() {
                place.share_link = resolve_link(&self.base_url, &place.share_link);
            }
        }

        if request.include_reviews() {
            let source = PlaceReviews {
                scraper: self,
                language: request.language(),
            };
            let max_reviews =
                usize::try_from(request.max_reviews_per_place()).unwrap_or(usize::MAX);
            places = enrich_places(&source, places, max_reviews, self.group_size, cancel)
                .await?
                .enriched;
        }

        tracing::info!(places = places.len(), "scrape finished");
        Ok(places)
    }
}

/// Fetches review pages through the scraper's transport and rules.
struct PlaceReviews<'a, F> {
    scraper: &'a PlaceScraper<F>,
    language: &'a str,
}

#[async_trait]
impl<'a, F: Fetcher> ReviewSource for PlaceReviews<'a, F> {
    async fn reviews_for(
        &self,
        place: &PlaceRecord,
        max_reviews: usize,
    ) -> Result<Vec<ReviewRecord>, ScraperError> {
        let Some(url) = build_review_url(&self.scraper.base_url, place, self.language) else {
            return Ok(Vec::new());
        };
        let page = self.scraper.fetcher.fetch(&url).await?;
        let extraction = extract_reviews(
            page.html(),
            &self.scraper.rules,
            max_reviews,
            self.scraper.observer.as_ref(),
        );
        tracing::debug!(
            place = %place.name,
            reviews = extraction.records.len(),
            "reviews extracted"
        );
        Ok(extraction.records)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
