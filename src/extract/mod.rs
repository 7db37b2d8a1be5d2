//! Result extraction: raw search-result document → ordered entry list.
//!
//! Parses the noisy HTML a relay hands back, walks link-bearing nodes in
//! document order, normalises and classifies their targets, and produces
//! a deduplicated, length-capped [`crate::types::ContentEntry`] list.

pub mod entries;
pub mod url_normalize;

pub use entries::extract_entries;
