//! # viewrank
//!
//! Exact search-rank determination for Naver view results.
//!
//! Given a set of keywords and a set of target content URLs, this crate
//! answers one question precisely: at which position, if any, does each
//! target appear in each keyword's view-search results? Searches are
//! fetched through a pool of public CORS relay endpoints, so the engine
//! runs without API keys or a server-side component.
//!
//! ## Design
//!
//! - Relay pool with health probing, automatic selection, and failover
//! - Canonical `(owner, content)` identity resolved from every Naver
//!   blog / in.naver URL shape, so equivalent URLs compare equal
//! - Noise-aware result extraction: ads, thumbnails, and optionally
//!   video/series modules are excluded before ranking
//! - Matching requires exact equality on both identity parts — an
//!   owner's other items never produce a false positive
//! - Bounded-concurrency batch runs with monotonic progress, ETA,
//!   cooperative cancellation, and per-keyword failure containment
//! - Per-run in-memory document cache, invalidated on retry
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - No network listeners — this is a library, not a server
//! - Keywords are logged only at trace level

pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod http;
pub mod identity;
pub mod matcher;
pub mod relay;
pub mod retry;
pub mod scheduler;
pub mod types;

pub use cancel::CancelToken;
pub use config::RankConfig;
pub use error::{RankError, RequestFailureKind, Result};
pub use executor::{QueryExecutor, StatusFn};
pub use matcher::RankMatch;
pub use relay::RelayPool;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use scheduler::{BatchScheduler, ProgressFn, RunReport};
pub use types::{
    ContentEntry, Identity, Platform, QueryResult, RankProgress, RankRecord, RelayEndpoint,
    RelayHealth, ReliabilityTier, RunStats, SpeedTier, StatusUpdate,
};

/// Check every keyword against every target URL and return the rank
/// record matrix.
///
/// Probes the built-in relay directory, auto-selects the healthy
/// relays, and runs the full batch. Records come back keyword-major in
/// input order; a keyword whose query fails yields errored records for
/// its targets rather than failing the run.
///
/// # Errors
///
/// Returns [`RankError::Config`] for an invalid configuration or
/// [`RankError::NoRelaysSelected`] when no relay survives the health
/// probe.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> viewrank::Result<()> {
/// let config = viewrank::RankConfig::default();
/// let report = viewrank::check_ranks(
///     &["맛집 추천".to_string()],
///     &["https://blog.naver.com/user_a/2230000100".to_string()],
///     &config,
/// )
/// .await?;
/// for record in &report.records {
///     println!("{} -> {:?}", record.keyword, record.position);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn check_ranks(
    keywords: &[String],
    targets: &[String],
    config: &RankConfig,
) -> Result<RunReport> {
    config.validate()?;
    let mut pool = RelayPool::with_default_directory();
    pool.check_all(config, true, &TokioSleeper).await?;
    let scheduler = BatchScheduler::new(pool, config.clone())?;
    scheduler.run(keywords, targets).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn check_ranks_validates_config_zero_attempts() {
        let config = RankConfig {
            max_attempts: 0,
            ..Default::default()
        };
        let result = check_ranks(&["test".to_string()], &[], &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_attempts"));
    }

    #[tokio::test]
    async fn check_ranks_validates_config_zero_entries() {
        let config = RankConfig {
            max_entries: 0,
            ..Default::default()
        };
        let result = check_ranks(&["test".to_string()], &[], &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_entries"));
    }

    #[tokio::test]
    async fn check_ranks_validates_config_zero_timeout() {
        let config = RankConfig {
            base_timeout_secs: 0,
            ..Default::default()
        };
        let result = check_ranks(&["test".to_string()], &[], &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }
}
