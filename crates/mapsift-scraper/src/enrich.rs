//! Group-wise review enrichment of extracted places.
//!
//! Places are processed in fixed-size groups. Every pipeline in a group runs
//! concurrently, and the next group starts only after the whole group has
//! settled, which caps simultaneous review fetches at the group size.

use async_trait::async_trait;
use futures::future::join_all;
use mapsift_core::{PlaceRecord, ReviewRecord};
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;

/// Number of places enriched concurrently unless configured otherwise.
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// Supplies the reviews for one place.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetches and extracts at most `max_reviews` reviews for `place`.
    async fn reviews_for(
        &self,
        place: &PlaceRecord,
        max_reviews: usize,
    ) -> Result<Vec<ReviewRecord>, ScraperError>;
}

/// Lifecycle of one place during enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichState {
    Pending,
    Fetching,
    Enriched,
    Failed,
}

/// A place whose enrichment failed and was dropped from the output.
#[derive(Debug)]
pub struct EnrichFailure {
    /// Position of the place in the input list.
    pub index: usize,
    pub name: String,
    pub error: ScraperError,
}

#[derive(Debug)]
pub struct EnrichmentReport {
    /// Places that completed, in completion order.
    pub enriched: Vec<PlaceRecord>,
    pub failures: Vec<EnrichFailure>,
    /// Final state per input position.
    pub states: Vec<EnrichState>,
}

/// Attaches reviews to every place, `group_size` places at a time.
///
/// Places without a share link or place id, and every place when
/// `max_reviews` is zero, complete with an empty review list and no fetch.
/// A failed place is reported in [`EnrichmentReport::failures`] and left out
/// of [`EnrichmentReport::enriched`]; its siblings are unaffected.
///
/// # Errors
///
/// Returns [`ScraperError::Cancelled`] if `cancel` fires before a group
/// starts or while one is in flight. In-flight pipelines are dropped and
/// their results discarded.
pub async fn enrich_places<S>(
    source: &S,
    places: Vec<PlaceRecord>,
    max_reviews: usize,
    group_size: usize,
    cancel: &CancellationToken,
) -> Result<EnrichmentReport, ScraperError>
where
    S: ReviewSource + ?Sized,
{
    let group_size = group_size.max(1);
    let total = places.len();
    let mut states = vec![EnrichState::Pending; total];
    let mut enriched = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut queue = places.into_iter().enumerate();

    loop {
        let group: Vec<(usize, PlaceRecord)> = queue.by_ref().take(group_size).collect();
        if group.is_empty() {
            break;
        }
        if cancel.is_cancelled() {
            return Err(ScraperError::Cancelled);
        }

        let pipelines: Vec<_> = group
            .into_iter()
            .map(|(index, place)| {
                let needs_fetch = max_reviews > 0 && place.has_review_source();
                if needs_fetch {
                    states[index] = EnrichState::Fetching;
                }
                async move {
                    if !needs_fetch {
                        return (index, Ok(place));
                    }
                    match source.reviews_for(&place, max_reviews).await {
                        Ok(mut reviews) => {
                            reviews.truncate(max_reviews);
                            (index, Ok(PlaceRecord { reviews, ..place }))
                        }
                        Err(error) => (index, Err((place.name, error))),
                    }
                }
            })
            .collect();

        let settled = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ScraperError::Cancelled),
            settled = join_all(pipelines) => settled,
        };

        for (index, outcome) in settled {
            match outcome {
                Ok(place) => {
                    states[index] = EnrichState::Enriched;
                    enriched.push(place);
                }
                Err((name, error)) => {
                    tracing::warn!(
                        index,
                        place = %name,
                        error = %error,
                        "review enrichment failed, dropping place"
                    );
                    states[index] = EnrichState::Failed;
                    failures.push(EnrichFailure { index, name, error });
                }
            }
        }
    }

    tracing::info!(
        total,
        enriched = enriched.len(),
        failed = failures.len(),
        "review enrichment finished"
    );
    Ok(EnrichmentReport {
        enriched,
        failures,
        states,
    })
}

#[cfg(test)]
#[path = "enrich_test.rs"]
mod tests;
