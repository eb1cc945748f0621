pub mod app_config;
pub mod config;
pub mod places;
pub mod request;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use places::{Coordinates, PlaceRecord, ReviewRecord, ANONYMOUS_AUTHOR, MIN_NAME_CHARS};
pub use request::{SearchRequest, SearchRequestBuilder};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Rejections raised while constructing a [`SearchRequest`]. Always surfaced
/// before any network activity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("max_results must be between {min} and {max}, got {value}")]
    MaxResultsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("max_reviews_per_place must be between {min} and {max}, got {value}")]
    MaxReviewsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("invalid coordinates ({lat}, {lng}): {reason}")]
    InvalidCoordinates { lat: f64, lng: f64, reason: String },

    #[error("language code must not be empty")]
    EmptyLanguage,
}
