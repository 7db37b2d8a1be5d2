//! Rank-check configuration with sensible defaults.
//!
//! [`RankConfig`] controls relay probing, per-relay timeouts, retry
//! behaviour, extraction filters, and progress estimation. Empirically
//! tuned values (the auto-selection settle delay, the remaining-time
//! safety factor) are plain fields rather than hard-wired constants.

use crate::error::RankError;

/// Configuration for a rank-check run.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Health-probe timeout per relay, in seconds.
    pub probe_timeout_secs: u64,
    /// Delay between finishing all health probes and applying the
    /// auto-selection policy, in milliseconds. Lets flapping endpoints
    /// stabilise before selection.
    pub settle_delay_ms: u64,
    /// How many remote relays auto-selection keeps when no local relay
    /// is online.
    pub max_selected_remote: usize,
    /// Base per-relay request timeout, in seconds. The i-th relay in the
    /// candidate order gets `base + step * i`.
    pub base_timeout_secs: u64,
    /// Per-position timeout increment, in seconds.
    pub timeout_step_secs: u64,
    /// Pause between consecutive relay attempts for one keyword, in
    /// milliseconds.
    pub relay_pause_ms: u64,
    /// Total attempts per keyword (1 initial + retries).
    pub max_attempts: usize,
    /// Backoff before each retry, in milliseconds. The last value repeats
    /// if there are more retries than entries.
    pub retry_backoff_ms: Vec<u64>,
    /// Maximum entries kept per keyword after extraction.
    pub max_entries: usize,
    /// Maximum keyword documents held in the per-run cache.
    pub cache_capacity: u64,
    /// Multiplier applied to the remaining-time estimate so it errs on
    /// the conservative side.
    pub eta_safety_factor: f64,
    /// Whether video-result blocks are excluded from extraction.
    pub filter_video: bool,
    /// Whether related/series link blocks are excluded from extraction.
    pub filter_series: bool,
    /// Custom User-Agent string. If `None`, rotates through a built-in
    /// list of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 8,
            settle_delay_ms: 4000,
            max_selected_remote: 3,
            base_timeout_secs: 5,
            timeout_step_secs: 1,
            relay_pause_ms: 800,
            max_attempts: 3,
            retry_backoff_ms: vec![2000, 4000],
            max_entries: 20,
            cache_capacity: 512,
            eta_safety_factor: 1.2,
            filter_video: true,
            filter_series: true,
            user_agent: None,
        }
    }
}

impl RankConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_attempts` must be greater than 0
    /// - `max_entries` must be greater than 0
    /// - `base_timeout_secs` and `probe_timeout_secs` must be greater than 0
    /// - `max_selected_remote` must be greater than 0
    /// - `eta_safety_factor` must be at least 1.0
    pub fn validate(&self) -> Result<(), RankError> {
        if self.max_attempts == 0 {
            return Err(RankError::Config("max_attempts must be greater than 0".into()));
        }
        if self.max_entries == 0 {
            return Err(RankError::Config("max_entries must be greater than 0".into()));
        }
        if self.base_timeout_secs == 0 {
            return Err(RankError::Config(
                "base_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.probe_timeout_secs == 0 {
            return Err(RankError::Config(
                "probe_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.max_selected_remote == 0 {
            return Err(RankError::Config(
                "max_selected_remote must be greater than 0".into(),
            ));
        }
        if self.eta_safety_factor < 1.0 {
            return Err(RankError::Config(
                "eta_safety_factor must be at least 1.0".into(),
            ));
        }
        Ok(())
    }
}
