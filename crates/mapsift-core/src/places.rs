use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shortest accepted place name, counted in characters after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// Author recorded for reviews whose author cannot be resolved.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// A WGS84 point. Only ever constructed from values that were actually
/// present in the source; there is no `(0, 0)` default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A business listing extracted from a search results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Provider place identifier. Empty when the source did not expose one;
    /// such records are addressed by position within their batch.
    pub place_id: String,
    /// Display name, always at least [`MIN_NAME_CHARS`] characters.
    pub name: String,
    pub category: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// Average rating. `None` when the source omits it; `0.0` is a real value.
    pub rating: Option<f64>,
    pub total_reviews: u32,
    /// Price tier token such as `"$$"`.
    pub price_level: Option<String>,
    pub opening_hours: BTreeMap<String, serde_json::Value>,
    pub coordinates: Option<Coordinates>,
    pub plus_code: Option<String>,
    /// Canonical link to the place page; empty when unknown.
    pub share_link: String,
    pub images: Vec<String>,
    pub attributes: Vec<String>,
    pub popular_times: BTreeMap<String, serde_json::Value>,
    pub reviews: Vec<ReviewRecord>,
}

impl PlaceRecord {
    /// Creates a record with every optional field empty.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            place_id: String::new(),
            name: name.into(),
            category: None,
            address: String::new(),
            phone: None,
            website: None,
            rating: None,
            total_reviews: 0,
            price_level: None,
            opening_hours: BTreeMap::new(),
            coordinates: None,
            plus_code: None,
            share_link: String::new(),
            images: Vec::new(),
            attributes: Vec::new(),
            popular_times: BTreeMap::new(),
            reviews: Vec::new(),
        }
    }

    /// Returns `true` when a share link or a place id is available to fetch
    /// reviews from.
    #[must_use]
    pub fn has_review_source(&self) -> bool {
        !self.share_link.is_empty() || !self.place_id.is_empty()
    }
}

/// A single user review attached to a [`PlaceRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub author: String,
    /// Star rating as published. Nominally 1-5 but not range-checked.
    pub rating: i64,
    pub text: String,
    /// Publication date exactly as shown, e.g. `"3 weeks ago"`.
    pub date: String,
    pub likes: u64,
    pub photos: Vec<String>,
}
