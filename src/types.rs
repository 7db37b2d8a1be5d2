//! Core types for relay endpoints, content identities, and rank records.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Reachability state of a relay endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayHealth {
    /// Not yet probed.
    Unknown,
    /// Last probe succeeded.
    Online,
    /// Last probe failed. Offline endpoints can never be selected.
    Offline,
}

/// Declared speed tier of a relay, from the static relay directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpeedTier {
    Slow,
    Medium,
    Fast,
}

/// Declared reliability tier of a relay, from the static relay directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReliabilityTier {
    Low,
    Medium,
    High,
}

/// A third-party relay endpoint that forwards requests to the search engine.
///
/// The outbound wire format is `base_url + percent_encode(search_url)`,
/// so `base_url` carries everything up to and including the query
/// parameter that receives the encoded target (e.g. `.../raw?url=`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEndpoint {
    /// Short stable name, used in status messages and the working-relay set.
    pub name: String,
    /// Prefix the encoded search URL is appended to.
    pub base_url: String,
    /// Declared speed tier.
    pub speed: SpeedTier,
    /// Declared reliability tier. Ranks above speed in auto-selection.
    pub reliability: ReliabilityTier,
    /// Current probed health.
    pub health: RelayHealth,
    /// Whether this endpoint is in the current candidate set.
    pub selected: bool,
}

impl RelayEndpoint {
    /// Create an endpoint with unknown health and no selection.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        speed: SpeedTier,
        reliability: ReliabilityTier,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            speed,
            reliability,
            health: RelayHealth::Unknown,
            selected: false,
        }
    }

    /// Returns `true` if this relay is hosted on the local machine.
    ///
    /// Local and remote relays are mutually exclusive in selection.
    pub fn is_local(&self) -> bool {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .is_some_and(|h| matches!(h.as_str(), "localhost" | "127.0.0.1" | "0.0.0.0" | "[::1]"))
    }
}

/// The two-part identity of one published content item.
///
/// `owner_id` identifies the publishing account; `content_id` identifies
/// one specific item under that owner. A `None` content id means the URL
/// shape only revealed the owner — such identities are never matchable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Identifier of the publishing account.
    pub owner_id: String,
    /// Purely numeric identifier of the item, or `None` if unresolvable.
    pub content_id: Option<String>,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content_id {
            Some(content) => write!(f, "{}/{}", self.owner_id, content),
            None => write!(f, "{}/-", self.owner_id),
        }
    }
}

/// Content-hosting platform a result URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Standard blog posts (`blog.naver.com`, mobile variant included).
    Blog,
    /// Creator/influencer content pages (`in.naver.com`).
    Creator,
}

impl Platform {
    /// Returns the human-readable name of this platform.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Creator => "creator",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One extracted, deduplicated, positioned search-result item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    /// The raw URL as it appeared in the document.
    pub url: String,
    /// The URL after redirector unwrapping and normalisation.
    pub normalized_url: String,
    /// Which platform hosts this entry.
    pub platform: Platform,
    /// Resolved two-part identity. Always has a content id — entries
    /// without one are discarded during extraction.
    pub identity: Identity,
    /// 1-based index within the keyword's truncated entry list.
    /// Strictly increasing, no gaps, assigned once and never reassigned.
    pub position: usize,
}

/// The outcome of querying and extracting one keyword.
///
/// Created and consumed within a single keyword's processing; not
/// retained beyond the run.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The keyword that was queried.
    pub keyword: String,
    /// Ordered, deduplicated entry list (≤ the configured maximum).
    pub entries: Vec<ContentEntry>,
    /// Set when the query or extraction failed after all retries.
    pub error: Option<String>,
}

/// The durable per-(keyword, target) output handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRecord {
    /// The keyword this record answers for.
    pub keyword: String,
    /// The target URL whose rank was checked.
    pub target_url: String,
    /// Whether the target was found in the keyword's entry list.
    pub found: bool,
    /// 1-based position when found.
    pub position: Option<usize>,
    /// How many entries the keyword's list held.
    pub total_entries: usize,
    /// Set when the keyword query failed or the target identity could
    /// not be resolved — distinct from a definitive not-found.
    pub error: Option<String>,
}

/// Aggregate statistics for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Records where the target was found.
    pub found: usize,
    /// Records where the target was definitively not found.
    pub not_found: usize,
    /// Records carrying an error.
    pub errored: usize,
    /// Relays observed to complete at least one request during the run.
    pub working_relays: Vec<String>,
}

/// One progress update, emitted after each keyword completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankProgress {
    /// Keywords completed so far.
    pub completed: usize,
    /// Total keywords in the run.
    pub total: usize,
    /// Completion percentage. Monotonically non-decreasing over a run.
    pub percent: f64,
    /// Human-readable progress message.
    pub message: String,
    /// Milliseconds elapsed since the run started.
    pub elapsed_ms: u64,
    /// Conservative remaining-time estimate, available once at least
    /// three keywords have completed.
    pub eta_ms: Option<u64>,
}

/// One status update, emitted after each relay attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// The keyword being queried.
    pub keyword: String,
    /// The relay that was attempted.
    pub relay: String,
    /// Outcome description ("ok", or a failure reason).
    pub message: String,
}
