//! Conversion of loosely-typed candidate objects into strict records.
//!
//! Every target field has an ordered alias list. The first alias whose value
//! is present, non-null, and (for text) non-blank is used; type coercion is
//! then applied to that one value only. A coercion failure falls back to the
//! field's default instead of trying the next alias.
//!
//! Nothing here performs I/O or logs. Rejections are returned to the caller.

use std::collections::BTreeMap;

use mapsift_core::{Coordinates, PlaceRecord, ReviewRecord, ANONYMOUS_AUTHOR, MIN_NAME_CHARS};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

const PLACE_ID: &[&str] = &["placeId", "place_id", "id", "cid"];
const NAME: &[&str] = &["name", "title", "displayName"];
const CATEGORY: &[&str] = &["category", "categoryName", "primaryTypeDisplayName"];
const CATEGORY_LIST: &[&str] = &["types", "categories"];
const ADDRESS: &[&str] = &["address", "formattedAddress", "formatted_address", "vicinity"];
const PHONE: &[&str] = &[
    "phone",
    "phoneNumber",
    "internationalPhoneNumber",
    "nationalPhoneNumber",
    "formattedPhoneNumber",
    "telephone",
];
const WEBSITE: &[&str] = &["website", "websiteUri", "websiteUrl", "url"];
const RATING: &[&str] = &["rating", "averageRating", "totalScore"];
const AGGREGATE_RATING: &[&str] = &["aggregateRating"];
const REVIEW_COUNT: &[&str] = &[
    "userRatingsTotal",
    "user_ratings_total",
    "userRatingCount",
    "reviewCount",
    "reviewsCount",
];
const PRICE_LEVEL: &[&str] = &["priceLevel", "price_level", "priceRange", "price"];
const OPENING_HOURS: &[&str] = &["openingHours", "opening_hours", "hours", "regularOpeningHours"];
const WEEKDAY_DESCRIPTIONS: &[&str] = &["weekdayDescriptions", "weekday_text"];
const COORDINATE_CONTAINERS: &[&str] = &["coordinates", "location", "geo", "latLng"];
const LATITUDE: &[&str] = &["lat", "latitude"];
const LONGITUDE: &[&str] = &["lng", "lon", "longitude"];
const PLUS_CODE: &[&str] = &["plusCode", "plus_code"];
const PLUS_CODE_PARTS: &[&str] = &["globalCode", "global_code", "compoundCode"];
const SHARE_LINK: &[&str] = &["url", "shareLink", "googleMapsUri", "share_link"];
const IMAGES: &[&str] = &["images", "photos", "imageUrls"];
const IMAGE_URL: &[&str] = &["url", "uri", "imageUrl", "photoUrl"];
const ATTRIBUTES: &[&str] = &["attributes", "amenities", "additionalInfo"];
const POPULAR_TIMES: &[&str] = &["popularTimes", "popular_times", "popularTimesHistogram"];

const AUTHOR: &[&str] = &["authorName", "author", "reviewer", "name"];
const AUTHOR_NAME: &[&str] = &["displayName", "name"];
const REVIEW_RATING: &[&str] = &["rating", "stars"];
const NESTED_REVIEW_RATING: &[&str] = &["reviewRating"];
const REVIEW_TEXT: &[&str] = &["text", "snippet", "reviewBody"];
const REVIEW_DATE: &[&str] = &[
    "publishedDate",
    "relativeTime",
    "relativePublishTimeDescription",
    "publishTime",
    "date",
];
const LIKES: &[&str] = &["likes", "thumbsUpCount", "likesCount"];
const REVIEW_PHOTOS: &[&str] = &["photos", "reviewImageUrls", "images"];

/// Why a candidate produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No name alias resolved to text.
    MissingName,
    /// The resolved name is shorter than [`MIN_NAME_CHARS`].
    NameTooShort { name: String },
    /// No rating alias was present.
    MissingRating,
    /// The rating was present but not numeric.
    InvalidRating { raw: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::MissingName => f.write_str("missing name"),
            Rejection::NameTooShort { name } => write!(f, "name too short: {name:?}"),
            Rejection::MissingRating => f.write_str("missing rating"),
            Rejection::InvalidRating { raw } => write!(f, "non-numeric rating: {raw}"),
        }
    }
}

/// Builds a [`PlaceRecord`] from a place-shaped candidate.
///
/// # Errors
///
/// The name is the only hard requirement: [`Rejection::MissingName`] or
/// [`Rejection::NameTooShort`]. Every other field degrades to its default.
pub fn normalize_place(candidate: &Object) -> Result<PlaceRecord, Rejection> {
    let name = resolve_name(candidate)?;

    let aggregate = lookup(candidate, AGGREGATE_RATING).and_then(Value::as_object);
    let rating = match lookup(candidate, RATING) {
        Some(value) => as_f64(value),
        None => aggregate
            .and_then(|a| lookup(a, &["ratingValue"]))
            .and_then(as_f64),
    };
    let total_reviews = lookup(candidate, REVIEW_COUNT)
        .or_else(|| aggregate.and_then(|a| lookup(a, &["reviewCount", "ratingCount"])))
        .and_then(as_u64)
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX));

    Ok(PlaceRecord {
        place_id: lookup(candidate, PLACE_ID)
            .and_then(as_text)
            .unwrap_or_default(),
        category: resolve_category(candidate),
        address: lookup(candidate, ADDRESS)
            .and_then(as_address)
            .unwrap_or_default(),
        phone: lookup(candidate, PHONE).and_then(as_text),
        website: lookup(candidate, WEBSITE).and_then(as_text),
        rating,
        total_reviews,
        price_level: lookup(candidate, PRICE_LEVEL).and_then(as_price_level),
        opening_hours: resolve_opening_hours(candidate),
        coordinates: resolve_coordinates(candidate),
        plus_code: lookup(candidate, PLUS_CODE).and_then(|v| match v {
            Value::Object(parts) => lookup(parts, PLUS_CODE_PARTS).and_then(as_text),
            other => as_text(other),
        }),
        share_link: lookup(candidate, SHARE_LINK)
            .and_then(as_text)
            .unwrap_or_default(),
        images: lookup(candidate, IMAGES).map_or_else(Vec::new, |v| {
            text_list(v, |item| lookup(item, IMAGE_URL).and_then(as_text))
        }),
        attributes: lookup(candidate, ATTRIBUTES)
            .map_or_else(Vec::new, |v| text_list(v, |_| None)),
        popular_times: lookup(candidate, POPULAR_TIMES)
            .and_then(Value::as_object)
            .map(to_btree)
            .unwrap_or_default(),
        reviews: Vec::new(),
        name,
    })
}

/// Builds a [`ReviewRecord`] from a review-shaped candidate.
///
/// # Errors
///
/// The rating has no safe default: [`Rejection::MissingRating`] when absent,
/// [`Rejection::InvalidRating`] when it does not parse as a number. Likes
/// that do not parse become `0` and keep the review.
pub fn normalize_review(candidate: &Object) -> Result<ReviewRecord, Rejection> {
    let raw_rating = lookup(candidate, REVIEW_RATING)
        .or_else(|| {
            lookup(candidate, NESTED_REVIEW_RATING)
                .and_then(Value::as_object)
                .and_then(|r| lookup(r, &["ratingValue"]))
        })
        .ok_or(Rejection::MissingRating)?;
    let rating = as_i64(raw_rating).ok_or_else(|| Rejection::InvalidRating {
        raw: raw_rating.to_string(),
    })?;

    let author = lookup(candidate, AUTHOR)
        .and_then(|v| match v {
            Value::Object(author) => lookup(author, AUTHOR_NAME).and_then(as_text),
            other => as_text(other),
        })
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_owned());

    Ok(ReviewRecord {
        author,
        rating,
        text: lookup(candidate, REVIEW_TEXT)
            .and_then(as_text)
            .unwrap_or_default(),
        date: lookup(candidate, REVIEW_DATE)
            .and_then(as_text)
            .unwrap_or_default(),
        likes: lookup(candidate, LIKES).and_then(as_u64).unwrap_or(0),
        photos: lookup(candidate, REVIEW_PHOTOS).map_or_else(Vec::new, |v| {
            text_list(v, |item| lookup(item, IMAGE_URL).and_then(as_text))
        }),
    })
}

fn resolve_name(candidate: &Object) -> Result<String, Rejection> {
    let name = lookup(candidate, NAME)
        .and_then(as_text)
        .ok_or(Rejection::MissingName)?;
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(Rejection::NameTooShort { name });
    }
    Ok(name)
}

fn resolve_category(candidate: &Object) -> Option<String> {
    lookup(candidate, CATEGORY).and_then(as_text).or_else(|| {
        lookup(candidate, CATEGORY_LIST)
            .and_then(Value::as_array)
            .and_then(|items| items.iter().find_map(as_text))
    })
}

fn resolve_opening_hours(candidate: &Object) -> BTreeMap<String, Value> {
    let Some(hours) = lookup(candidate, OPENING_HOURS) else {
        return BTreeMap::new();
    };
    match hours {
        Value::Object(object) => match lookup(object, WEEKDAY_DESCRIPTIONS) {
            Some(Value::Array(lines)) => weekday_lines(lines),
            _ => to_btree(object),
        },
        Value::Array(lines) => weekday_lines(lines),
        _ => BTreeMap::new(),
    }
}

/// Turns `["Monday: 7 AM-5 PM", ...]` into `{"Monday": "7 AM-5 PM", ...}`.
fn weekday_lines(lines: &[Value]) -> BTreeMap<String, Value> {
    lines
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|line| line.split_once(':'))
        .map(|(day, hours)| (day.trim().to_owned(), Value::String(hours.trim().to_owned())))
        .filter(|(day, _)| !day.is_empty())
        .collect()
}

/// Resolves a coordinate pair from a `{lat, lng}` style container or a
/// nested `location`/`geometry.location` object. Both halves must be
/// numeric and on the globe, otherwise there are no coordinates.
fn resolve_coordinates(candidate: &Object) -> Option<Coordinates> {
    let nested = candidate
        .get("geometry")
        .and_then(Value::as_object)
        .and_then(|g| g.get("location"));

    COORDINATE_CONTAINERS
        .iter()
        .filter_map(|key| candidate.get(*key))
        .chain(nested)
        .filter_map(Value::as_object)
        .find_map(|container| {
            let lat = lookup(container, LATITUDE).and_then(as_f64)?;
            let lng = lookup(container, LONGITUDE).and_then(as_f64)?;
            let on_globe = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
            on_globe.then_some(Coordinates { lat, lng })
        })
}

/// First alias whose value is present, non-null, and not a blank string.
fn lookup<'a>(object: &'a Object, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| match object.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    })
}

/// Text from a string, a number, or a `{"text": ...}` wrapper.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(object) => lookup(object, &["text"]).and_then(as_text),
        _ => None,
    }
}

/// A plain string, or a postal-address object joined into one line.
fn as_address(value: &Value) -> Option<String> {
    const PARTS: [&str; 5] = [
        "streetAddress",
        "addressLocality",
        "addressRegion",
        "postalCode",
        "addressCountry",
    ];
    match value {
        Value::Object(object) if !object.contains_key("text") => {
            let parts: Vec<String> = PARTS
                .iter()
                .filter_map(|key| object.get(*key).and_then(as_text))
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => as_text(other),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Integer coercion. Fractions are truncated toward zero.
#[allow(clippy::cast_possible_truncation)]
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Non-negative count; thousands separators in strings are ignored.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

/// Price tier token. Numeric levels become `$` repeated, enum-style
/// strings are mapped, anything else is kept verbatim.
fn as_price_level(value: &Value) -> Option<String> {
    if let Value::Number(n) = value {
        let level = n.as_u64().filter(|l| *l > 0)?;
        return Some("$".repeat(usize::try_from(level.min(4)).unwrap_or(4)));
    }
    let text = as_text(value)?;
    let mapped = match text.as_str() {
        "PRICE_LEVEL_FREE" => "Free",
        "PRICE_LEVEL_INEXPENSIVE" => "$",
        "PRICE_LEVEL_MODERATE" => "$$",
        "PRICE_LEVEL_EXPENSIVE" => "$$$",
        "PRICE_LEVEL_VERY_EXPENSIVE" => "$$$$",
        "PRICE_LEVEL_UNSPECIFIED" => return None,
        _ => return Some(text),
    };
    Some(mapped.to_owned())
}

/// Strings from an array. Non-string items go through `from_object` when
/// they are objects.
fn text_list(value: &Value, from_object: impl Fn(&Object) -> Option<String>) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(object) => from_object(object),
                other => as_text(other),
            })
            .collect(),
        other => as_text(other).into_iter().collect(),
    }
}

fn to_btree(object: &Object) -> BTreeMap<String, Value> {
    object
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
