//! URL construction for search and place pages.

use mapsift_core::{PlaceRecord, SearchRequest};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in path segments and query values.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Zoom level appended to coordinate-anchored searches.
const SEARCH_ZOOM: &str = "15z";

/// Form-style encoding: spaces become `+`.
fn encode_plus(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT)
        .to_string()
        .replace("%20", "+")
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// `{base}/search/{query}[/@{lat},{lng},15z]?hl={language}`
#[must_use]
pub fn build_search_url(base_url: &str, request: &SearchRequest) -> String {
    let mut url = format!("{base_url}/search/{}", encode_plus(&request.full_query()));
    if let Some(coords) = request.coordinates() {
        url.push_str(&format!("/@{},{},{SEARCH_ZOOM}", coords.lat, coords.lng));
    }
    url.push_str("?hl=");
    url.push_str(&encode(request.language()));
    url
}

/// The page holding `place`'s reviews: its share link when known, else a
/// place URL built from the id. `None` when the place has neither.
#[must_use]
pub fn build_review_url(base_url: &str, place: &PlaceRecord, language: &str) -> Option<String> {
    if !place.share_link.is_empty() {
        return Some(resolve_link(base_url, &place.share_link));
    }
    if place.place_id.is_empty() {
        return None;
    }
    Some(format!(
        "{base_url}/place/{}?hl={}",
        encode(&place.place_id),
        encode(language)
    ))
}

/// Resolves a root-relative link against the origin of `base_url`. Absolute
/// links are returned unchanged.
#[must_use]
pub fn resolve_link(base_url: &str, link: &str) -> String {
    if !link.starts_with('/') || link.starts_with("//") {
        return link.to_owned();
    }
    format!("{}{link}", origin(base_url))
}

/// `scheme://host[:port]` of `url`.
fn origin(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let host_start = scheme_end + 3;
    match url[host_start..].find('/') {
        Some(path_start) => &url[..host_start + path_start],
        None => url,
    }
}
