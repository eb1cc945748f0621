//! Pattern-based fallback extraction from raw markup.
//!
//! Cards are discovered with an ordered list of CSS selectors: the first
//! selector that matches anything is used alone. Each card is then scanned
//! field by field with ordered regex rules, first match wins. The result is
//! a candidate object keyed like the embedded data, so the same normalizer
//! and acceptance gate apply to both extraction strategies.
//!
//! The literal selectors and patterns track the live page structure and are
//! expected to drift; they live in [`MarkupRules`] so callers can replace
//! them without touching the algorithm.

use regex::Regex;
use scraper::Selector;
use serde_json::{Map, Value};

use crate::fetch::select_outer_html;

type Object = Map<String, Value>;

/// An ordered list of patterns for one field. Capture group 1 is the value.
#[derive(Debug, Clone)]
pub struct FieldRule {
    key: &'static str,
    patterns: Vec<Regex>,
}

impl FieldRule {
    /// # Panics
    ///
    /// Panics if a pattern is not a valid regex. Intended for literal
    /// patterns; use [`FieldRule::try_new`] for patterns read at runtime.
    #[must_use]
    pub fn new(key: &'static str, patterns: &[&str]) -> Self {
        Self::try_new(key, patterns).expect("valid regex")
    }

    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn try_new(key: &'static str, patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { key, patterns })
    }

    /// Candidate key the captured value is stored under.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    fn first_match(&self, card: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            re.captures(card)
                .and_then(|cap| cap.get(1))
                .map(|m| decode_entities(m.as_str().trim()))
                .filter(|s| !s.is_empty())
        })
    }
}

/// Card selectors and field rules for one record shape.
#[derive(Debug, Clone)]
pub struct CardRules {
    selectors: Vec<Selector>,
    fields: Vec<FieldRule>,
}

impl CardRules {
    #[must_use]
    pub fn new(selectors: Vec<Selector>, fields: Vec<FieldRule>) -> Self {
        Self { selectors, fields }
    }

    /// Outer HTML of the cards found by the first selector that matches
    /// anything.
    fn discover(&self, html: &str) -> Vec<String> {
        self.selectors
            .iter()
            .map(|selector| select_outer_html(html, selector))
            .find(|cards| !cards.is_empty())
            .unwrap_or_default()
    }

    fn scan(&self, card: &str) -> Object {
        self.fields
            .iter()
            .filter_map(|rule| {
                rule.first_match(card)
                    .map(|value| (rule.key.to_owned(), Value::String(value)))
            })
            .collect()
    }
}

/// The full fallback rule set.
#[derive(Debug, Clone)]
pub struct MarkupRules {
    pub places: CardRules,
    pub reviews: CardRules,
}

impl Default for MarkupRules {
    fn default() -> Self {
        Self {
            places: CardRules::new(
                selectors(&[r#"[role="article"]"#, ".Nv2PK"]),
                vec![
                    FieldRule::new("name", &[r#"aria-label="([^"]+)""#, r"<h3[^>]*>([^<]+)</h3>"]),
                    FieldRule::new("rating", &[r"(?i)(\d+(?:\.\d+)?)\s*star"]),
                    FieldRule::new(
                        "userRatingsTotal",
                        &[r"(?i)\((\d+(?:,\d+)*)\s*(?:review|rating)"],
                    ),
                    FieldRule::new("placeId", &[r#"/place/([^/?"&]+)"#]),
                    FieldRule::new(
                        "url",
                        &[
                            r#"href="((?:https?://[^"/]+)?/maps/place/[^"]+)""#,
                        ],
                    ),
                    FieldRule::new(
                        "category",
                        &[r"<span[^>]*>\s*·\s*([^<·]+?)\s*(?:·|</span>)"],
                    ),
                    FieldRule::new(
                        "address",
                        &[
                            r"(?i)<div[^>]*>\s*([^<]*\b(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln|Way|Place|Pl)\b[^<]*)\s*</div>",
                        ],
                    ),
                ],
            ),
            reviews: CardRules::new(
                selectors(&["[data-review-id]", ".jftiEf"]),
                vec![
                    FieldRule::new(
                        "author",
                        &[r#"aria-label="Photo of ([^"]+)""#, r"<button[^>]*>([^<]+)</button>"],
                    ),
                    FieldRule::new("rating", &[r#"(?i)aria-label="\s*(\d+)\s+stars?"#]),
                    FieldRule::new(
                        "text",
                        &[
                            r#"<span[^>]*class="[^"]*review-text[^"]*"[^>]*>([^<]+)</span>"#,
                            r#"<(?:div|span)[^>]*class="[^"]*wiI7pd[^"]*"[^>]*>([^<]+)</(?:div|span)>"#,
                        ],
                    ),
                    FieldRule::new(
                        "date",
                        &[
                            r"(?i)(\d+\s+(?:day|week|month|year)s?\s+ago)",
                            r"(?i)\b(an?\s+(?:day|week|month|year)\s+ago)",
                        ],
                    ),
                    FieldRule::new("likes", &[r"(?i)(\d+)\s+(?:like|helpful)"]),
                ],
            ),
        }
    }
}

fn selectors(css: &[&str]) -> Vec<Selector> {
    css.iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
}

/// A card that could not be turned into a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    /// No name rule matched card `index`.
    MissingName { index: usize },
}

impl std::fmt::Display for CardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardError::MissingName { index } => write!(f, "card {index} has no name"),
        }
    }
}

/// Candidates assembled from cards, plus the cards that were skipped.
#[derive(Debug, Default)]
pub struct CardScan {
    pub candidates: Vec<Object>,
    pub skipped: Vec<CardError>,
}

/// Place candidates from `html`, one per discovered card, in document order.
#[must_use]
pub fn place_candidates(html: &str, rules: &MarkupRules) -> CardScan {
    let mut scan = CardScan::default();
    for (index, card) in rules.places.discover(html).iter().enumerate() {
        let candidate = rules.places.scan(card);
        if candidate.contains_key("name") {
            scan.candidates.push(candidate);
        } else {
            scan.skipped.push(CardError::MissingName { index });
        }
    }
    scan
}

/// Review candidates from `html`, one per discovered card, in document order.
#[must_use]
pub fn review_candidates(html: &str, rules: &MarkupRules) -> Vec<Object> {
    rules
        .reviews
        .discover(html)
        .iter()
        .map(|card| rules.reviews.scan(card))
        .collect()
}

/// Decodes the handful of entities the HTML serializer emits in attribute
/// and text content.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "markup_test.rs"]
mod tests;
