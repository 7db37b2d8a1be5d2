//! Error types for the viewrank crate.
//!
//! All errors use stable string messages suitable for display to operators
//! and programmatic handling. Per-keyword and per-target failures are
//! contained to their unit of work; only [`RankError::NoRelaysSelected`]
//! aborts a batch before it starts.

use std::fmt;

/// Classification of a single failed relay request.
///
/// Drives relay failover: the executor records the kind per relay and
/// includes it in the aggregate [`RankError::RelayExhausted`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFailureKind {
    /// The request exceeded its per-relay timeout.
    Timeout,
    /// The upstream engine (or relay) rejected the request as automated.
    Blocked,
    /// The relay or engine returned HTTP 429.
    RateLimited,
    /// Connection-level failure (DNS, refused, reset).
    Network,
    /// Any other non-success HTTP status.
    Http,
}

impl fmt::Display for RequestFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Blocked => "blocked",
            Self::RateLimited => "rate-limited",
            Self::Network => "network",
            Self::Http => "http",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during rank-check operations.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// A relay health probe failed. Non-fatal — only flips the endpoint
    /// to offline.
    #[error("relay probe failed: {0}")]
    RelayHealth(String),

    /// A single relay request failed with a classified reason.
    #[error("relay {relay} failed ({kind}): {detail}")]
    RelayRequest {
        /// Name of the relay that failed.
        relay: String,
        /// Failure classification.
        kind: RequestFailureKind,
        /// Human-readable detail.
        detail: String,
    },

    /// Every selected relay failed for one keyword query.
    #[error("all relays exhausted: {0}")]
    RelayExhausted(String),

    /// A target URL has no extractable content id. Fatal to that one
    /// target only — owner-only matching is disallowed.
    #[error("target identity unresolved: {0}")]
    IdentityUnresolved(String),

    /// No relay endpoint is selected. Hard precondition failure for
    /// starting any batch.
    #[error("no relays selected — run a health check and select at least one relay")]
    NoRelaysSelected,

    /// The requested relay does not exist in the pool.
    #[error("unknown relay: {0}")]
    UnknownRelay(String),

    /// Manual selection of an offline relay was rejected.
    #[error("relay {0} is offline and cannot be selected")]
    RelayOffline(String),

    /// The run was cancelled cooperatively.
    #[error("run cancelled")]
    Cancelled,

    /// An HTTP client could not be constructed or a response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a search-result document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for viewrank results.
pub type Result<T> = std::result::Result<T, RankError>;
