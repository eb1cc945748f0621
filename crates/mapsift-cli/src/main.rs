use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mapsift_core::request::{DEFAULT_LANGUAGE, DEFAULT_MAX_RESULTS, DEFAULT_MAX_REVIEWS_PER_PLACE};
use mapsift_core::{SearchRequest, ValidationError};
use mapsift_scraper::PlaceScraper;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mapsift")]
#[command(about = "Extract place listings and reviews from map search results")]
struct Cli {
    /// Search terms, e.g. "coffee shops".
    query: String,

    /// Free-text area appended to the query.
    #[arg(long)]
    location: Option<String>,

    /// Latitude to anchor the search on; requires --lng.
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude to anchor the search on; requires --lat.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: u32,

    /// Fetch each place's page and attach its reviews.
    #[arg(long)]
    include_reviews: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_REVIEWS_PER_PLACE)]
    max_reviews: u32,

    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Write JSON here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Cli {
    fn to_request(&self) -> Result<SearchRequest, ValidationError> {
        let mut builder = SearchRequest::builder(self.query.as_str())
            .max_results(self.max_results)
            .include_reviews(self.include_reviews)
            .max_reviews_per_place(self.max_reviews)
            .language(self.language.as_str());
        if let Some(location) = &self.location {
            builder = builder.location(location.as_str());
        }
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            builder = builder.coordinates(lat, lng);
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = mapsift_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let request = cli.to_request()?;
    let scraper = PlaceScraper::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling scrape");
            on_interrupt.cancel();
        }
    });

    let places = scraper.scrape_with_cancel(&request, &cancel).await?;
    let json = serde_json::to_string_pretty(&places)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(places = places.len(), path = %path.display(), "results written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
