//! Retry policy and sleep abstraction.
//!
//! Inline `tokio::time::sleep` calls are replaced by an explicit
//! [`RetryPolicy`] (max attempts, backoff schedule) and an injectable
//! [`Sleeper`] so retry timing is unit-testable without real waiting.

use crate::config::RankConfig;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Async sleep abstraction, injectable for tests.
pub trait Sleeper: Send + Sync {
    /// Suspend the calling task for `duration`.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Sleeper that returns immediately. For tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(std::future::ready(()))
    }
}

/// Bounded retry schedule for one keyword's query loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts (1 initial + retries).
    pub max_attempts: usize,
    /// Backoff before each retry. The last entry repeats when there are
    /// more retries than entries; an empty schedule means no backoff.
    pub backoff: Vec<Duration>,
}

impl RetryPolicy {
    /// Build a policy from explicit values.
    pub fn new(max_attempts: usize, backoff: Vec<Duration>) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Build the policy a [`RankConfig`] describes.
    pub fn from_config(config: &RankConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: config
                .retry_backoff_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }

    /// The delay to wait before the given attempt (0-based).
    ///
    /// Attempt 0 is the initial try and has no delay. Retry `n` uses the
    /// `n-1`-th backoff entry, saturating at the last entry.
    pub fn delay_before(&self, attempt: usize) -> Option<Duration> {
        if attempt == 0 || self.backoff.is_empty() {
            return None;
        }
        let index = (attempt - 1).min(self.backoff.len() - 1);
        Some(self.backoff[index])
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RankConfig::default())
    }
}
