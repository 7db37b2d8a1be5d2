//! Batch orchestration: keyword×target matrix, bounded concurrency,
//! progress, and cancellation.
//!
//! Keywords are partitioned into sequential batches sized to the number
//! of selected relays; inside a batch, keyword tasks run concurrently
//! (overlapping network waits on a cooperative runtime — no worker
//! threads). Per-keyword failures are contained: an exhausted keyword
//! yields errored records for its targets and never aborts siblings.
//! The final record matrix is reassembled in input order regardless of
//! completion order.

use crate::cancel::CancelToken;
use crate::config::RankConfig;
use crate::error::{RankError, Result};
use crate::executor::{QueryExecutor, StatusFn};
use crate::extract::extract_entries;
use crate::matcher::{self, RankMatch};
use crate::relay::RelayPool;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::types::{QueryResult, RankProgress, RankRecord, RunStats};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Caller-side progress callback, invoked after each keyword completes.
pub type ProgressFn = Arc<dyn Fn(RankProgress) + Send + Sync>;

/// The full output of one batch run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One record per (keyword, target), keyword-major, in input order.
    pub records: Vec<RankRecord>,
    /// Aggregate counts plus the working-relay set.
    pub stats: RunStats,
}

/// Drives the keyword×target matrix through query, extraction, and
/// matching. One scheduler instance owns one run's relay pool and
/// document cache — nothing is shared across runs.
pub struct BatchScheduler {
    pool: RelayPool,
    config: RankConfig,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
    on_status: Option<StatusFn>,
    on_progress: Option<ProgressFn>,
}

impl BatchScheduler {
    /// Create a scheduler over an already-selected relay pool.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] if the configuration is invalid.
    pub fn new(pool: RelayPool, config: RankConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            sleeper: Arc::new(TokioSleeper),
            cancel: CancelToken::new(),
            on_status: None,
            on_progress: None,
        })
    }

    /// Attach a per-relay-attempt status callback.
    #[must_use]
    pub fn with_status(mut self, on_status: StatusFn) -> Self {
        self.on_status = Some(on_status);
        self
    }

    /// Attach a per-keyword progress callback.
    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Attach a cancellation token. Cancel it to stop launching new
    /// relay requests and abandon in-flight ones; computed records are
    /// preserved.
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

    /// Run the full keyword×target matrix.
    ///
    /// Concurrency equals the number of selected relays (minimum 1).
    /// Returns the record matrix in input order plus aggregate stats —
    /// a partial matrix when cancelled mid-run.
    ///
    /// # Errors
    ///
    /// Only [`RankError::NoRelaysSelected`] aborts before starting.
    /// Every per-keyword or per-target failure is contained in its
    /// records.
    pub async fn run(&self, keywords: &[String], targets: &[String]) -> Result<RunReport> {
        let selected = self.pool.selected();
        if selected.is_empty() {
            return Err(RankError::NoRelaysSelected);
        }
        let concurrency = selected.len().max(1);

        let mut executor = QueryExecutor::new(selected, self.config.clone())?
            .with_cancel(self.cancel.clone())
            .with_sleeper(Arc::clone(&self.sleeper));
        if let Some(on_status) = &self.on_status {
            executor = executor.with_status(Arc::clone(on_status));
        }
        let retry = RetryPolicy::from_config(&self.config);

        let total = keywords.len();
        let started = Instant::now();
        let progress = Mutex::new(ProgressState::default());
        let mut query_results: Vec<Option<QueryResult>> = (0..total).map(|_| None).collect();

        let indexed: Vec<(usize, &String)> = keywords.iter().enumerate().collect();
        for batch in indexed.chunks(concurrency) {
            if self.cancel.is_cancelled() {
                tracing::debug!("cancelled between batches");
                break;
            }

            let tasks = batch.iter().map(|(index, keyword)| {
                let executor = &executor;
                let retry = &retry;
                let progress = &progress;
                async move {
                    let result = self.run_keyword(executor, retry, keyword).await;
                    self.note_completed(progress, total, started);
                    (*index, result)
                }
            });

            for (index, result) in futures::future::join_all(tasks).await {
                query_results[index] = Some(result);
            }
        }

        let (records, mut stats) = assemble_records(keywords, targets, query_results);
        stats.working_relays = executor.working_relays();

        tracing::debug!(
            found = stats.found,
            not_found = stats.not_found,
            errored = stats.errored,
            "run complete"
        );
        Ok(RunReport { records, stats })
    }

    /// One keyword's bounded retry loop: query, then extract.
    async fn run_keyword(
        &self,
        executor: &QueryExecutor,
        retry: &RetryPolicy,
        keyword: &str,
    ) -> QueryResult {
        let mut last_error: Option<RankError> = None;

        for attempt in 0..retry.max_attempts {
            if self.cancel.is_cancelled() {
                last_error = Some(RankError::Cancelled);
                break;
            }
            if let Some(delay) = retry.delay_before(attempt) {
                self.sleeper.sleep(delay).await;
            }

            match executor.execute(keyword, attempt).await {
                Ok(document) => {
                    return match extract_entries(&document, &self.config) {
                        Ok(entries) => QueryResult {
                            keyword: keyword.to_string(),
                            entries,
                            error: None,
                        },
                        // Parse failures are deterministic; retrying the
                        // same selectors cannot help.
                        Err(err) => QueryResult {
                            keyword: keyword.to_string(),
                            entries: Vec::new(),
                            error: Some(err.to_string()),
                        },
                    };
                }
                Err(RankError::Cancelled) => {
                    last_error = Some(RankError::Cancelled);
                    break;
                }
                Err(err) => {
                    tracing::warn!(keyword, attempt, error = %err, "keyword attempt failed");
                    last_error = Some(err);
                }
            }
        }

        QueryResult {
            keyword: keyword.to_string(),
            entries: Vec::new(),
            error: Some(
                last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "search failed".to_string()),
            ),
        }
    }

    /// Record a keyword completion and emit monotonic progress.
    fn note_completed(&self, progress: &Mutex<ProgressState>, total: usize, started: Instant) {
        let Ok(mut state) = progress.lock() else {
            return;
        };
        state.completed += 1;

        let raw_percent = if total == 0 {
            100.0
        } else {
            state.completed as f64 / total as f64 * 100.0
        };
        // Percentage must never regress, even under timing noise.
        let percent = raw_percent.max(state.last_percent);
        state.last_percent = percent;

        let elapsed = started.elapsed();
        let eta_ms = estimate_remaining_ms(
            state.completed,
            total,
            elapsed.as_millis() as u64,
            self.config.eta_safety_factor,
        );

        if let Some(on_progress) = &self.on_progress {
            on_progress(RankProgress {
                completed: state.completed,
                total,
                percent,
                message: format!("{}/{} keywords processed", state.completed, total),
                elapsed_ms: elapsed.as_millis() as u64,
                eta_ms,
            });
        }
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    completed: usize,
    last_percent: f64,
}

/// Conservative remaining-time estimate: average per-item time times
/// remaining count, padded by the safety factor. Only available once at
/// least three items have completed.
fn estimate_remaining_ms(
    completed: usize,
    total: usize,
    elapsed_ms: u64,
    safety_factor: f64,
) -> Option<u64> {
    if completed < 3 || completed >= total {
        return None;
    }
    let avg = elapsed_ms as f64 / completed as f64;
    let remaining = (total - completed) as f64;
    Some((avg * remaining * safety_factor) as u64)
}

/// Assemble the keyword-major record matrix in input order and tally
/// aggregate stats. A missing query result (cancelled before it started)
/// or an errored one yields error records for every target under that
/// keyword.
fn assemble_records(
    keywords: &[String],
    targets: &[String],
    mut query_results: Vec<Option<QueryResult>>,
) -> (Vec<RankRecord>, RunStats) {
    let mut records = Vec::with_capacity(keywords.len() * targets.len());
    let mut stats = RunStats::default();

    for (index, keyword) in keywords.iter().enumerate() {
        let query_result = query_results.get_mut(index).and_then(Option::take);

        for target in targets {
            let record = match &query_result {
                None => error_record(keyword, target, &RankError::Cancelled.to_string()),
                Some(result) => match &result.error {
                    Some(error) => error_record(keyword, target, error),
                    None => match matcher::match_rank(target, &result.entries) {
                        Ok(RankMatch::Found { position }) => RankRecord {
                            keyword: keyword.clone(),
                            target_url: target.clone(),
                            found: true,
                            position: Some(position),
                            total_entries: result.entries.len(),
                            error: None,
                        },
                        Ok(RankMatch::NotFound { .. }) => RankRecord {
                            keyword: keyword.clone(),
                            target_url: target.clone(),
                            found: false,
                            position: None,
                            total_entries: result.entries.len(),
                            error: None,
                        },
                        Err(err) => RankRecord {
                            keyword: keyword.clone(),
                            target_url: target.clone(),
                            found: false,
                            position: None,
                            total_entries: result.entries.len(),
                            error: Some(err.to_string()),
                        },
                    },
                },
            };

            if record.error.is_some() {
                stats.errored += 1;
            } else if record.found {
                stats.found += 1;
            } else {
                stats.not_found += 1;
            }
            records.push(record);
        }
    }

    (records, stats)
}

fn error_record(keyword: &str, target: &str, error: &str) -> RankRecord {
    RankRecord {
        keyword: keyword.to_string(),
        target_url: target.to_string(),
        found: false,
        position: None,
        total_entries: 0,
        error: Some(error.to_string()),
    }
}
