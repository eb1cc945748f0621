//! Strategy selection for one fetched page: embedded-data walk first,
//! markup fallback only when the walk accepts nothing.

use mapsift_core::{PlaceRecord, ReviewRecord};
use serde_json::{Map, Value};

use crate::extract::{
    embedded_payloads, find_candidates, markup, normalize_place, normalize_review, CardError,
    MarkupRules, RecordShape, Rejection,
};

type Object = Map<String, Value>;

/// Which strategy produced an [`Extraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Tree,
    Markup,
    /// Both strategies ran and neither produced a record.
    Empty,
}

impl ExtractionSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionSource::Tree => "tree",
            ExtractionSource::Markup => "markup",
            ExtractionSource::Empty => "empty",
        }
    }
}

/// Accepted records from one page, capped at the requested count.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub source: ExtractionSource,
}

/// Sink for extraction events. The extraction steps themselves stay pure;
/// every event is routed through here.
pub trait ExtractionObserver: Send + Sync {
    fn candidate_rejected(&self, _shape: RecordShape, _rejection: &Rejection) {}

    fn card_skipped(&self, _error: &CardError) {}

    fn strategy_selected(&self, _shape: RecordShape, _source: ExtractionSource, _accepted: usize) {
    }
}

/// Routes extraction events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn candidate_rejected(&self, shape: RecordShape, rejection: &Rejection) {
        tracing::trace!(?shape, %rejection, "candidate rejected");
    }

    fn card_skipped(&self, error: &CardError) {
        tracing::warn!(%error, "skipping malformed card");
    }

    fn strategy_selected(&self, shape: RecordShape, source: ExtractionSource, accepted: usize) {
        tracing::debug!(?shape, source = source.as_str(), accepted, "extraction finished");
    }
}

/// Extracts up to `max` places from `html`.
#[must_use]
pub fn extract_places(
    html: &str,
    rules: &MarkupRules,
    max: usize,
    observer: &dyn ExtractionObserver,
) -> Extraction<PlaceRecord> {
    extract(html, RecordShape::Place, max, observer, normalize_place, || {
        let scan = markup::place_candidates(html, rules);
        for error in &scan.skipped {
            observer.card_skipped(error);
        }
        scan.candidates
    })
}

/// Extracts up to `max` reviews from `html`.
#[must_use]
pub fn extract_reviews(
    html: &str,
    rules: &MarkupRules,
    max: usize,
    observer: &dyn ExtractionObserver,
) -> Extraction<ReviewRecord> {
    extract(html, RecordShape::Review, max, observer, normalize_review, || {
        markup::review_candidates(html, rules)
    })
}

/// Candidates are normalized before the cap is applied, so rejected
/// candidates never take a slot from a valid one.
fn extract<T>(
    html: &str,
    shape: RecordShape,
    max: usize,
    observer: &dyn ExtractionObserver,
    normalize: fn(&Object) -> Result<T, Rejection>,
    fallback: impl FnOnce() -> Vec<Object>,
) -> Extraction<T> {
    let payloads = embedded_payloads(html);
    let mut records = accept(find_candidates(&payloads, shape), shape, normalize, observer);
    let mut source = ExtractionSource::Tree;

    if records.is_empty() {
        let candidates = fallback();
        records = accept(candidates.iter(), shape, normalize, observer);
        source = if records.is_empty() {
            ExtractionSource::Empty
        } else {
            ExtractionSource::Markup
        };
    }

    records.truncate(max);
    observer.strategy_selected(shape, source, records.len());
    Extraction { records, source }
}

fn accept<'a, T>(
    candidates: impl IntoIterator<Item = &'a Object>,
    shape: RecordShape,
    normalize: fn(&Object) -> Result<T, Rejection>,
    observer: &dyn ExtractionObserver,
) -> Vec<T> {
    candidates
        .into_iter()
        .filter_map(|candidate| match normalize(candidate) {
            Ok(record) => Some(record),
            Err(rejection) => {
                observer.candidate_rejected(shape, &rejection);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingObserver {
        rejections: Mutex<Vec<Rejection>>,
        skipped: Mutex<Vec<CardError>>,
        selections: Mutex<Vec<ExtractionSource>>,
    }

    impl ExtractionObserver for RecordingObserver {
        fn candidate_rejected(&self, _shape: RecordShape, rejection: &Rejection) {
            self.rejections.lock().unwrap().push(rejection.clone());
        }

        fn card_skipped(&self, error: &CardError) {
            self.skipped.lock().unwrap().push(error.clone());
        }

        fn strategy_selected(&self, _shape: RecordShape, source: ExtractionSource, _accepted: usize) {
            self.selections.lock().unwrap().push(source);
        }
    }

    fn names(places: &[PlaceRecord]) -> Vec<&str> {
        places.iter().map(|p| p.name.as_str()).collect()
    }

    const CARDS: &str = r#"
        <div role="article" aria-label="Card Cafe"><span>4.1 stars</span></div>
        <div role="article"><span>no name</span></div>
        <div role="article" aria-label="Other Card"></div>
    "#;

    #[test]
    fn invalid_candidates_do_not_consume_the_cap() {
        let html = r#"<script>window.APP_INITIALIZATION_STATE=[
            {"name": ""}, {"name": "A"}, {"name": "Ritual"}, {"title": null}, {"name": "Sightglass"}
        ];</script>"#;
        let observer = RecordingObserver::default();
        let extraction = extract_places(html, &MarkupRules::default(), 2, &observer);
        assert_eq!(extraction.source, ExtractionSource::Tree);
        assert_eq!(names(&extraction.records), vec!["Ritual", "Sightglass"]);
        assert_eq!(observer.rejections.lock().unwrap().len(), 3);
    }

    #[test]
    fn tree_hit_never_consults_markup() {
        let html = format!(
            r#"<script>window.APP_INITIALIZATION_STATE=[{{"name": "Tree Cafe"}}];</script>{CARDS}"#
        );
        let observer = RecordingObserver::default();
        let extraction = extract_places(&html, &MarkupRules::default(), 10, &observer);
        assert_eq!(extraction.source, ExtractionSource::Tree);
        assert_eq!(names(&extraction.records), vec!["Tree Cafe"]);
        assert!(observer.skipped.lock().unwrap().is_empty());
    }

    #[test]
    fn markup_runs_once_when_tree_accepts_nothing() {
        let html = format!(
            r#"<script>window.APP_INITIALIZATION_STATE=[{{"name": "X"}}];</script>{CARDS}"#
        );
        let observer = RecordingObserver::default();
        let extraction = extract_places(&html, &MarkupRules::default(), 10, &observer);
        assert_eq!(extraction.source, ExtractionSource::Markup);
        assert_eq!(names(&extraction.records), vec!["Card Cafe", "Other Card"]);
        assert_eq!(extraction.records[0].rating, Some(4.1));
        assert_eq!(
            *observer.skipped.lock().unwrap(),
            vec![CardError::MissingName { index: 1 }]
        );
        assert_eq!(
            *observer.selections.lock().unwrap(),
            vec![ExtractionSource::Markup]
        );
    }

    #[test]
    fn nothing_found_is_empty_not_an_error() {
        let extraction = extract_places("<p>blocked</p>", &MarkupRules::default(), 5, &TracingObserver);
        assert_eq!(extraction.source, ExtractionSource::Empty);
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn output_never_exceeds_max() {
        let items: Vec<String> = (0..20).map(|i| format!(r#"{{"name":"Cafe {i}"}}"#)).collect();
        let html = format!(
            "<script>window.APP_INITIALIZATION_STATE=[{}];</script>",
            items.join(",")
        );
        for max in [1, 5, 20, 50] {
            let extraction = extract_places(&html, &MarkupRules::default(), max, &TracingObserver);
            assert_eq!(extraction.records.len(), max.min(20));
        }
    }

    #[test]
    fn reviews_drop_bad_ratings_and_keep_bad_likes() {
        let html = r#"<script type="application/ld+json">{"review": [
            {"author": "Ana", "text": "Lovely", "rating": 5, "likes": "lots"},
            {"author": "Bo", "text": "Meh", "rating": "two"},
            {"author": "Cy", "text": "Fine", "stars": "3"}
        ]}</script>"#;
        let observer = RecordingObserver::default();
        let extraction = extract_reviews(html, &MarkupRules::default(), 10, &observer);
        assert_eq!(extraction.source, ExtractionSource::Tree);
        let authors: Vec<_> = extraction.records.iter().map(|r| r.author.as_str()).collect();
        assert_eq!(authors, vec!["Ana", "Cy"]);
        assert_eq!(extraction.records[0].likes, 0);
        assert!(matches!(
            observer.rejections.lock().unwrap()[0],
            Rejection::InvalidRating { .. }
        ));
    }

    #[test]
    fn json_ld_reviews_are_extracted_from_the_tree() {
        let html = r#"<script type="application/ld+json">{
            "@type": "LocalBusiness",
            "name": "Garden Cafe",
            "review": [{
                "@type": "Review",
                "author": {"@type": "Person", "name": "Priya"},
                "reviewBody": "Lovely garden seating",
                "reviewRating": {"@type": "Rating", "ratingValue": 5}
            }]
        }</script>"#;
        let extraction = extract_reviews(html, &MarkupRules::default(), 10, &TracingObserver);
        assert_eq!(extraction.source, ExtractionSource::Tree);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].author, "Priya");
        assert_eq!(extraction.records[0].rating, 5);
    }

    #[test]
    fn review_markup_fallback_applies_the_cap() {
        let html = r#"
            <div data-review-id="1"><span aria-label="5 stars"></span><span class="review-text">One</span></div>
            <div data-review-id="2"><span aria-label="4 stars"></span><span class="review-text">Two</span></div>
            <div data-review-id="3"><span class="review-text">No rating</span></div>
        "#;
        let extraction = extract_reviews(html, &MarkupRules::default(), 1, &TracingObserver);
        assert_eq!(extraction.source, ExtractionSource::Markup);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].text, "One");
        assert_eq!(extraction.records[0].rating, 5);
    }
}
