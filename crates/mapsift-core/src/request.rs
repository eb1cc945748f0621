//! Validated search input.
//!
//! A [`SearchRequest`] can only be obtained through [`SearchRequest::new`] or
//! [`SearchRequestBuilder::build`], both of which enforce the input ranges, so
//! every request reaching the scraper is already known to be well-formed.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::places::Coordinates;
use crate::ValidationError;

pub const MAX_RESULTS_RANGE: RangeInclusive<u32> = 1..=1000;
pub const MAX_REVIEWS_RANGE: RangeInclusive<u32> = 0..=500;

pub const DEFAULT_MAX_RESULTS: u32 = 100;
pub const DEFAULT_MAX_REVIEWS_PER_PLACE: u32 = 50;
pub const DEFAULT_LANGUAGE: &str = "en";

/// Immutable, validated search parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    search_query: String,
    location: Option<String>,
    coordinates: Option<Coordinates>,
    max_results: u32,
    include_reviews: bool,
    max_reviews_per_place: u32,
    language: String,
}

impl SearchRequest {
    /// Creates a request with default caps and no location.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyQuery`] if `query` is blank.
    pub fn new(query: impl Into<String>) -> Result<Self, ValidationError> {
        Self::builder(query).build()
    }

    #[must_use]
    pub fn builder(query: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder {
            search_query: query.into(),
            location: None,
            coordinates: None,
            max_results: DEFAULT_MAX_RESULTS,
            include_reviews: false,
            max_reviews_per_place: DEFAULT_MAX_REVIEWS_PER_PLACE,
            language: DEFAULT_LANGUAGE.to_owned(),
        }
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    #[must_use]
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    #[must_use]
    pub fn include_reviews(&self) -> bool {
        self.include_reviews
    }

    #[must_use]
    pub fn max_reviews_per_place(&self) -> u32 {
        self.max_reviews_per_place
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The free-text query sent to the search page: the query followed by the
    /// location, when one is set.
    #[must_use]
    pub fn full_query(&self) -> String {
        match &self.location {
            Some(location) => format!("{} {location}", self.search_query),
            None => self.search_query.clone(),
        }
    }
}

/// Builder for [`SearchRequest`]. Nothing is checked until [`Self::build`].
#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    search_query: String,
    location: Option<String>,
    coordinates: Option<Coordinates>,
    max_results: u32,
    include_reviews: bool,
    max_reviews_per_place: u32,
    language: String,
}

impl SearchRequestBuilder {
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lng });
        self
    }

    #[must_use]
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn include_reviews(mut self, include_reviews: bool) -> Self {
        self.include_reviews = include_reviews;
        self
    }

    #[must_use]
    pub fn max_reviews_per_place(mut self, max_reviews: u32) -> Self {
        self.max_reviews_per_place = max_reviews;
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Validates and freezes the request.
    ///
    /// Blank locations are dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank query or language, caps
    /// outside their ranges, or coordinates that are not finite or not on
    /// the globe.
    pub fn build(self) -> Result<SearchRequest, ValidationError> {
        let search_query = self.search_query.trim().to_owned();
        if search_query.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        if !MAX_RESULTS_RANGE.contains(&self.max_results) {
            return Err(ValidationError::MaxResultsOutOfRange {
                value: self.max_results,
                min: *MAX_RESULTS_RANGE.start(),
                max: *MAX_RESULTS_RANGE.end(),
            });
        }

        if !MAX_REVIEWS_RANGE.contains(&self.max_reviews_per_place) {
            return Err(ValidationError::MaxReviewsOutOfRange {
                value: self.max_reviews_per_place,
                min: *MAX_REVIEWS_RANGE.start(),
                max: *MAX_REVIEWS_RANGE.end(),
            });
        }

        if let Some(coords) = self.coordinates {
            validate_coordinates(coords)?;
        }

        let language = self.language.trim().to_owned();
        if language.is_empty() {
            return Err(ValidationError::EmptyLanguage);
        }

        let location = self
            .location
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());

        Ok(SearchRequest {
            search_query,
            location,
            coordinates: self.coordinates,
            max_results: self.max_results,
            include_reviews: self.include_reviews,
            max_reviews_per_place: self.max_reviews_per_place,
            language,
        })
    }
}

fn validate_coordinates(coords: Coordinates) -> Result<(), ValidationError> {
    let Coordinates { lat, lng } = coords;
    let reason = if !lat.is_finite() || !lng.is_finite() {
        Some("coordinates must be finite")
    } else if !(-90.0..=90.0).contains(&lat) {
        Some("latitude must be within -90..=90")
    } else if !(-180.0..=180.0).contains(&lng) {
        Some("longitude must be within -180..=180")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ValidationError::InvalidCoordinates {
            lat,
            lng,
            reason: reason.to_owned(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "request_test.rs"]
mod tests;
