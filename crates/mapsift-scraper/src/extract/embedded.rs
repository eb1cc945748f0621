//! Locating and decoding data payloads embedded in page markup.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Script assignments that carry the page's initial data, in priority order.
const WINDOW_ASSIGNMENTS: [&str; 2] = ["APP_INITIALIZATION_STATE", "APP_OPTIONS"];

static LD_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

static ASSIGNMENT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    WINDOW_ASSIGNMENTS
        .iter()
        .map(|name| Regex::new(&format!(r"window\.{name}\s*=\s*")).expect("valid regex"))
        .collect()
});

/// Decodes every embedded payload found in `html`: the window assignments
/// first, then any `application/ld+json` blocks.
///
/// Payloads that cannot be cut out or decoded are skipped. An empty result
/// means "no embedded data", not an error.
pub(crate) fn embedded_payloads(html: &str) -> Vec<Value> {
    let mut payloads = Vec::new();

    for re in ASSIGNMENT_RES.iter() {
        for m in re.find_iter(html) {
            let rest = &html[m.end()..];
            if let Some(value) = extract_balanced(rest).and_then(decode) {
                payloads.push(value);
            }
        }
    }

    for cap in LD_JSON_RE.captures_iter(html) {
        if let Some(value) = cap.get(1).and_then(|m| decode(m.as_str().trim())) {
            payloads.push(value);
        }
    }

    payloads
}

fn decode(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text).ok()
}

/// Returns the shortest prefix of `s` that is a complete JSON array or
/// object, or `None` if `s` does not start with `[`/`{` or is unterminated.
///
/// String literals and escapes are respected, so brackets inside strings do
/// not affect depth.
pub(crate) fn extract_balanced(s: &str) -> Option<&str> {
    let mut expected_closers = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if i == 0 && c != '[' && c != '{' {
            return None;
        }
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => expected_closers.push(']'),
            '{' => expected_closers.push('}'),
            ']' | '}' => {
                if expected_closers.pop() != Some(c) {
                    return None;
                }
                if expected_closers.is_empty() {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
