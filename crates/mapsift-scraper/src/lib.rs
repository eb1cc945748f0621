pub mod client;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod proxy;
pub mod rate_limit;
pub mod retry;

pub use client::PlaceScraper;
pub use enrich::{enrich_places, EnrichState, EnrichmentReport, ReviewSource};
pub use error::ScraperError;
pub use extract::MarkupRules;
pub use fetch::{Fetcher, HttpFetcher, Page, ResilientFetcher};
pub use pipeline::{extract_places, extract_reviews, Extraction, ExtractionObserver, ExtractionSource};
pub use proxy::{NoProxy, ProxyHandle, ProxyProvider, RotatingProxyPool};
pub use rate_limit::{IntervalRateLimiter, RateGate};
pub use retry::RetryPolicy;
