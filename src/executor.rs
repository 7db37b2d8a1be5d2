//! Keyword query execution with relay failover, retry-aware caching,
//! and per-attempt timeouts.
//!
//! One executor serves one run. It holds a snapshot of the selected
//! relays, the run's document cache, and the known-working relay set.
//! All mutation happens between suspension points on a cooperative
//! runtime, so the only lock is the cheap one around the working set.

use crate::cache::DocumentCache;
use crate::cancel::CancelToken;
use crate::config::RankConfig;
use crate::error::{RankError, RequestFailureKind, Result};
use crate::http;
use crate::retry::{Sleeper, TokioSleeper};
use crate::types::{RelayEndpoint, StatusUpdate};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Caller-side status callback, invoked after each relay attempt.
/// This is the engine's only coupling to presentation.
pub type StatusFn = Arc<dyn Fn(StatusUpdate) + Send + Sync>;

/// Executes keyword queries through the selected relay candidates.
pub struct QueryExecutor {
    client: reqwest::Client,
    relays: Vec<RelayEndpoint>,
    cache: DocumentCache,
    config: RankConfig,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
    on_status: Option<StatusFn>,
    working: Mutex<HashSet<String>>,
}

impl QueryExecutor {
    /// Build an executor over the given relay candidates.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Http`] if the HTTP client cannot be built.
    pub fn new(relays: Vec<RelayEndpoint>, config: RankConfig) -> Result<Self> {
        let client = http::build_client(&config)?;
        let cache = DocumentCache::new(config.cache_capacity);
        Ok(Self {
            client,
            relays,
            cache,
            config,
            sleeper: Arc::new(TokioSleeper),
            cancel: CancelToken::new(),
            on_status: None,
            working: Mutex::new(HashSet::new()),
        })
    }

    /// Attach a status callback.
    #[must_use]
    pub fn with_status(mut self, on_status: StatusFn) -> Self {
        self.on_status = Some(on_status);
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the sleep implementation (tests use a no-op sleeper).
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The run's document cache.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Relays that completed at least one request this run, sorted.
    pub fn working_relays(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .working
            .lock()
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Fetch one keyword's raw search-result document.
    ///
    /// Attempt 0 returns the cached document when present, issuing no
    /// network call. Later attempts invalidate the keyword's cache entry
    /// first (retries always hit the network) and shuffle the relay
    /// order so a retry does not repeatedly hit the same failing relay
    /// first. The i-th candidate gets a timeout of `base + step * i`.
    ///
    /// # Errors
    ///
    /// [`RankError::RelayExhausted`] aggregating every relay's failure
    /// reason when all candidates fail, [`RankError::NoRelaysSelected`]
    /// with an empty candidate list, or [`RankError::Cancelled`].
    pub async fn execute(&self, keyword: &str, attempt: usize) -> Result<String> {
        if attempt == 0 {
            if let Some(document) = self.cache.get(keyword).await {
                tracing::trace!(keyword, "cache hit");
                return Ok((*document).clone());
            }
        } else {
            self.cache.invalidate(keyword).await;
        }

        if self.relays.is_empty() {
            return Err(RankError::NoRelaysSelected);
        }

        let target = http::search_url(keyword);
        let mut candidates: Vec<&RelayEndpoint> = self.relays.iter().collect();
        if attempt > 0 {
            candidates.shuffle(&mut rand::thread_rng());
        }

        let mut failures: Vec<String> = Vec::new();
        let last = candidates.len() - 1;

        for (index, relay) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(RankError::Cancelled);
            }

            let timeout = Duration::from_secs(
                self.config.base_timeout_secs + self.config.timeout_step_secs * index as u64,
            );

            match self.fetch_via(relay, &target, timeout).await {
                Ok(document) => {
                    self.cache.insert(keyword, document.clone()).await;
                    self.record_working(&relay.name);
                    self.emit_status(keyword, &relay.name, "ok");
                    tracing::debug!(keyword, relay = %relay.name, bytes = document.len(), "query ok");
                    return Ok(document);
                }
                Err(RankError::Cancelled) => return Err(RankError::Cancelled),
                Err(err) => {
                    tracing::warn!(keyword, relay = %relay.name, error = %err, "relay attempt failed");
                    self.emit_status(keyword, &relay.name, &err.to_string());
                    failures.push(format!("{}: {err}", relay.name));
                    if index < last {
                        self.sleeper
                            .sleep(Duration::from_millis(self.config.relay_pause_ms))
                            .await;
                    }
                }
            }
        }

        Err(RankError::RelayExhausted(failures.join("; ")))
    }

    /// One relay request, raced against cancellation.
    async fn fetch_via(
        &self,
        relay: &RelayEndpoint,
        target: &str,
        timeout: Duration,
    ) -> Result<String> {
        let wire = http::relay_url(&relay.base_url, target);
        let request = http::browser_headers(self.client.get(&wire)).timeout(timeout);

        let response = tokio::select! {
            outcome = request.send() => {
                outcome.map_err(|e| classify_transport_error(&relay.name, &e))?
            }
            () = self.cancel.cancelled() => return Err(RankError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(&relay.name, status));
        }

        response
            .text()
            .await
            .map_err(|e| RankError::RelayRequest {
                relay: relay.name.clone(),
                kind: RequestFailureKind::Network,
                detail: format!("response read failed: {e}"),
            })
    }

    fn record_working(&self, name: &str) {
        if let Ok(mut set) = self.working.lock() {
            set.insert(name.to_string());
        }
    }

    fn emit_status(&self, keyword: &str, relay: &str, message: &str) {
        if let Some(on_status) = &self.on_status {
            on_status(StatusUpdate {
                keyword: keyword.to_string(),
                relay: relay.to_string(),
                message: message.to_string(),
            });
        }
    }
}

/// Classify a transport-level failure for failover decisions.
fn classify_transport_error(relay: &str, err: &reqwest::Error) -> RankError {
    let kind = if err.is_timeout() {
        RequestFailureKind::Timeout
    } else {
        RequestFailureKind::Network
    };
    RankError::RelayRequest {
        relay: relay.to_string(),
        kind,
        detail: err.to_string(),
    }
}

/// Classify a non-success HTTP status for failover decisions.
fn classify_status(relay: &str, status: reqwest::StatusCode) -> RankError {
    let kind = match status.as_u16() {
        429 => RequestFailureKind::RateLimited,
        403 | 418 | 451 => RequestFailureKind::Blocked,
        _ => RequestFailureKind::Http,
    };
    RankError::RelayRequest {
        relay: relay.to_string(),
        kind,
        detail: format!("HTTP {status}"),
    }
}
