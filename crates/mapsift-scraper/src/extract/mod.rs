//! Record extraction from fetched markup.
//!
//! Two strategies share one normalizer: a heuristic walk over embedded data
//! payloads, and a pattern-based scan of rendered cards used only when the
//! walk yields nothing.

mod embedded;
pub mod markup;
pub mod normalize;
pub mod tree;

pub(crate) use embedded::embedded_payloads;
pub use markup::{CardError, CardRules, CardScan, FieldRule, MarkupRules};
pub use normalize::{normalize_place, normalize_review, Rejection};
pub use tree::{find_candidates, RecordShape};
