//! Exact rank matching of one target within one keyword's entry list.
//!
//! The core correctness guarantee of the engine lives here: a match
//! requires exact equality on **both** identity parts. Owner-only
//! matching is disallowed — one owner may publish many distinct items,
//! and matching on owner alone would report false positives.

use crate::error::{RankError, Result};
use crate::identity;
use crate::types::ContentEntry;

/// Outcome of matching one target against one entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMatch {
    /// The target appears at this 1-based position.
    Found {
        /// Position of the first exact match.
        position: usize,
    },
    /// The target does not appear. `owner_present` records whether any
    /// entry shares the target's owner — diagnostics only; both cases
    /// report the same externally-visible not-found result.
    NotFound {
        /// Whether the owner appeared with other items.
        owner_present: bool,
    },
}

/// Find the target URL's exact position within an entry list.
///
/// # Errors
///
/// Returns [`RankError::IdentityUnresolved`] when the target URL yields
/// no content id, regardless of entry contents.
pub fn match_rank(target_url: &str, entries: &[ContentEntry]) -> Result<RankMatch> {
    let target = identity::resolve(target_url)
        .ok_or_else(|| RankError::IdentityUnresolved(target_url.to_string()))?;
    let Some(target_content) = target.content_id.as_deref() else {
        return Err(RankError::IdentityUnresolved(target_url.to_string()));
    };

    let mut owner_present = false;
    for entry in entries.iter().filter(|e| e.identity.owner_id == target.owner_id) {
        owner_present = true;
        if entry.identity.content_id.as_deref() == Some(target_content) {
            tracing::trace!(position = entry.position, "exact match");
            return Ok(RankMatch::Found {
                position: entry.position,
            });
        }
    }

    tracing::trace!(owner_present, "no exact match");
    Ok(RankMatch::NotFound { owner_present })
}
