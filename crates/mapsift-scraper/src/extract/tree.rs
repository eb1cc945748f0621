//! Heuristic search for record-shaped objects inside decoded payloads.

use serde_json::{Map, Value};

/// The kind of record a candidate object should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    Place,
    Review,
}

const PLACE_NAME_KEYS: [&str; 3] = ["name", "title", "displayName"];
const REVIEW_TEXT_KEYS: [&str; 3] = ["text", "snippet", "reviewBody"];
const REVIEW_RATING_KEYS: [&str; 3] = ["rating", "stars", "reviewRating"];

impl RecordShape {
    /// Maximum number of candidates collected per payload set.
    #[must_use]
    pub fn candidate_limit(self) -> usize {
        match self {
            RecordShape::Place => 100,
            RecordShape::Review => 500,
        }
    }

    /// Key-presence test. Values are not inspected; a present-but-null name
    /// still makes a place candidate and is rejected later by normalization.
    #[must_use]
    pub fn accepts(self, object: &Map<String, Value>) -> bool {
        let has_any = |keys: &[&str]| keys.iter().any(|k| object.contains_key(*k));
        match self {
            RecordShape::Place => has_any(&PLACE_NAME_KEYS),
            RecordShape::Review => has_any(&REVIEW_TEXT_KEYS) && has_any(&REVIEW_RATING_KEYS),
        }
    }
}

/// Collects objects matching `shape` from `roots`, in pre-order.
///
/// The walk uses an explicit stack, so nesting depth is bounded only by
/// memory. A matching object is still descended into, so an object and the
/// matches nested inside it are all returned. Collection stops once
/// [`RecordShape::candidate_limit`] objects have been found.
#[must_use]
pub fn find_candidates(roots: &[Value], shape: RecordShape) -> Vec<&Map<String, Value>> {
    let limit = shape.candidate_limit();
    let mut found = Vec::new();
    let mut stack: Vec<&Value> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(object) => {
                if shape.accepts(object) {
                    found.push(object);
                    if found.len() >= limit {
                        break;
                    }
                }
                stack.extend(object.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(found: &[&Map<String, Value>]) -> Vec<String> {
        found
            .iter()
            .map(|o| {
                ["name", "title"]
                    .iter()
                    .find_map(|k| o.get(*k).and_then(Value::as_str))
                    .unwrap_or("")
                    .to_owned()
            })
            .collect()
    }

    #[test]
    fn place_shape_accepts_any_name_like_key() {
        for key in ["name", "title", "displayName"] {
            let mut object = Map::new();
            object.insert(key.to_owned(), json!("x"));
            assert!(RecordShape::Place.accepts(&object), "{key} not accepted");
        }
        let object = json!({"label": "x"});
        assert!(!RecordShape::Place.accepts(object.as_object().unwrap()));
    }

    #[test]
    fn review_shape_needs_text_and_rating() {
        let both = json!({"text": "Great", "stars": 5});
        let text_only = json!({"text": "Great"});
        let rating_only = json!({"rating": 4});
        assert!(RecordShape::Review.accepts(both.as_object().unwrap()));
        assert!(!RecordShape::Review.accepts(text_only.as_object().unwrap()));
        assert!(!RecordShape::Review.accepts(rating_only.as_object().unwrap()));
    }

    #[test]
    fn review_shape_accepts_schema_org_review() {
        let review = json!({
            "@type": "Review",
            "reviewBody": "Lovely garden seating",
            "reviewRating": {"@type": "Rating", "ratingValue": "5"}
        });
        assert!(RecordShape::Review.accepts(review.as_object().unwrap()));
    }

    #[test]
    fn traversal_is_pre_order_and_descends_into_matches() {
        let payload = json!([
            {"name": "outer", "children": [{"name": "inner"}]},
            [[{"title": "deep"}]],
            {"name": "last"}
        ]);
        let roots = [payload];
        let found = find_candidates(&roots, RecordShape::Place);
        assert_eq!(names(&found), vec!["outer", "inner", "deep", "last"]);
    }

    #[test]
    fn object_keys_are_visited_in_document_order() {
        let payload: Value =
            serde_json::from_str(r#"{"z": {"name": "first"}, "a": {"name": "second"}}"#).unwrap();
        let roots = [payload];
        let found = find_candidates(&roots, RecordShape::Place);
        assert_eq!(names(&found), vec!["first", "second"]);
    }

    #[test]
    fn walks_multiple_roots_in_order() {
        let roots = [json!({"name": "a"}), json!([{"name": "b"}])];
        let found = find_candidates(&roots, RecordShape::Place);
        assert_eq!(names(&found), vec!["a", "b"]);
    }

    #[test]
    fn truncates_to_place_limit() {
        let items: Vec<Value> = (0..250).map(|i| json!({"name": format!("p{i}")})).collect();
        let roots = [Value::Array(items)];
        let found = find_candidates(&roots, RecordShape::Place);
        assert_eq!(found.len(), 100);
        assert_eq!(names(&found)[99], "p99");
    }

    #[test]
    fn truncates_to_review_limit() {
        let items: Vec<Value> = (0..600).map(|_| json!({"text": "ok", "rating": 5})).collect();
        let roots = [Value::Array(items)];
        assert_eq!(find_candidates(&roots, RecordShape::Review).len(), 500);
    }

    #[test]
    fn survives_deep_nesting() {
        let mut value = json!({"name": "bottom"});
        for _ in 0..1_000 {
            value = json!([value]);
        }
        let roots = [value];
        let found = find_candidates(&roots, RecordShape::Place);
        assert_eq!(names(&found), vec!["bottom"]);
    }

    #[test]
    fn empty_when_nothing_matches() {
        let roots = [json!({"a": [1, 2, {"b": null}]}), json!("scalar")];
        assert!(find_candidates(&roots, RecordShape::Place).is_empty());
        assert!(find_candidates(&[], RecordShape::Review).is_empty());
    }
}
