//! Relay pool: endpoint directory, health probing, and selection.
//!
//! Tracks the candidate relay endpoints, probes their reachability, and
//! maintains the current selection under one invariant: locally-hosted
//! and remote relays are mutually exclusive — selecting one side
//! deselects the other — and an offline endpoint can never be selected.
//!
//! Health is assessed at startup and on manual refresh, independent of
//! any run. Probe failures are non-fatal: they only flip health.

use crate::config::RankConfig;
use crate::error::{RankError, Result};
use crate::http;
use crate::retry::Sleeper;
use crate::types::{RelayEndpoint, RelayHealth, ReliabilityTier, SpeedTier};
use std::time::Duration;

/// Stable, known-good probe target: the search host itself, which is
/// exactly what a relay must be able to reach to be useful.
const PROBE_TARGET: &str = "https://search.naver.com/";

/// The candidate relay endpoints and their selection state.
#[derive(Debug, Clone)]
pub struct RelayPool {
    endpoints: Vec<RelayEndpoint>,
}

impl RelayPool {
    /// Build a pool from an explicit endpoint list.
    pub fn new(endpoints: Vec<RelayEndpoint>) -> Self {
        Self { endpoints }
    }

    /// Build a pool from the built-in relay directory.
    pub fn with_default_directory() -> Self {
        Self::new(default_directory())
    }

    /// All endpoints in stored (preference) order.
    pub fn endpoints(&self) -> &[RelayEndpoint] {
        &self.endpoints
    }

    /// The current candidate list used by the query executor, in stored
    /// order.
    pub fn selected(&self) -> Vec<RelayEndpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.selected)
            .cloned()
            .collect()
    }

    /// Probe one endpoint: a single bounded-timeout request through the
    /// relay to a stable target. Returns the resulting health.
    pub async fn health_check(
        client: &reqwest::Client,
        endpoint: &RelayEndpoint,
        timeout: Duration,
    ) -> RelayHealth {
        let wire = http::relay_url(&endpoint.base_url, PROBE_TARGET);
        let outcome = http::browser_headers(client.get(&wire))
            .timeout(timeout)
            .send()
            .await;

        match outcome {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(relay = %endpoint.name, "probe ok");
                RelayHealth::Online
            }
            Ok(response) => {
                tracing::warn!(relay = %endpoint.name, status = %response.status(), "probe rejected");
                RelayHealth::Offline
            }
            Err(err) => {
                tracing::warn!(relay = %endpoint.name, error = %err, "probe failed");
                RelayHealth::Offline
            }
        }
    }

    /// Probe every endpoint concurrently and record the results.
    ///
    /// When `auto_select` is set, waits the configured settle delay after
    /// the probes finish (flapping endpoints stabilise) and then applies
    /// the selection policy: all online local relays if any exist,
    /// otherwise the top remote relays ranked by reliability then speed.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Http`] only if the HTTP client cannot be
    /// built. Individual probe failures never error.
    pub async fn check_all(
        &mut self,
        config: &RankConfig,
        auto_select: bool,
        sleeper: &dyn Sleeper,
    ) -> Result<()> {
        let client = http::build_client(config)?;
        let timeout = Duration::from_secs(config.probe_timeout_secs);

        let probes = self.endpoints.iter().map(|endpoint| {
            let client = client.clone();
            async move { Self::health_check(&client, endpoint, timeout).await }
        });
        let healths = futures::future::join_all(probes).await;

        for (endpoint, health) in self.endpoints.iter_mut().zip(healths) {
            endpoint.health = health;
            if endpoint.health == RelayHealth::Offline {
                endpoint.selected = false;
            }
        }

        if auto_select {
            sleeper
                .sleep(Duration::from_millis(config.settle_delay_ms))
                .await;
            self.auto_select(config.max_selected_remote);
        }
        Ok(())
    }

    /// Apply the automatic selection policy to the current health state.
    pub fn auto_select(&mut self, max_remote: usize) {
        let any_local_online = self
            .endpoints
            .iter()
            .any(|e| e.is_local() && e.health == RelayHealth::Online);

        if any_local_online {
            for endpoint in &mut self.endpoints {
                endpoint.selected = endpoint.is_local() && endpoint.health == RelayHealth::Online;
            }
            tracing::debug!("auto-selected local relays");
            return;
        }

        // Rank online remote relays by reliability, then speed.
        let mut ranked: Vec<usize> = self
            .endpoints
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_local() && e.health == RelayHealth::Online)
            .map(|(i, _)| i)
            .collect();
        ranked.sort_by(|&a, &b| {
            let ea = &self.endpoints[a];
            let eb = &self.endpoints[b];
            eb.reliability
                .cmp(&ea.reliability)
                .then(eb.speed.cmp(&ea.speed))
        });
        ranked.truncate(max_remote);

        for (i, endpoint) in self.endpoints.iter_mut().enumerate() {
            endpoint.selected = ranked.contains(&i);
        }
        tracing::debug!(count = ranked.len(), "auto-selected remote relays");
    }

    /// Manually select an endpoint by name.
    ///
    /// Honours the mutual-exclusivity invariant: selecting a local relay
    /// deselects all remote relays and vice versa.
    ///
    /// # Errors
    ///
    /// [`RankError::UnknownRelay`] if no endpoint has that name, or
    /// [`RankError::RelayOffline`] if the endpoint is offline.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let index = self.index_of(name)?;
        if self.endpoints[index].health == RelayHealth::Offline {
            return Err(RankError::RelayOffline(name.to_string()));
        }

        let selecting_local = self.endpoints[index].is_local();
        for endpoint in &mut self.endpoints {
            if endpoint.is_local() != selecting_local {
                endpoint.selected = false;
            }
        }
        self.endpoints[index].selected = true;
        Ok(())
    }

    /// Manually deselect an endpoint by name.
    ///
    /// # Errors
    ///
    /// [`RankError::UnknownRelay`] if no endpoint has that name.
    pub fn deselect(&mut self, name: &str) -> Result<()> {
        let index = self.index_of(name)?;
        self.endpoints[index].selected = false;
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.endpoints
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| RankError::UnknownRelay(name.to_string()))
    }
}

/// The built-in relay directory with declared speed/reliability tiers,
/// ordered by preference.
pub fn default_directory() -> Vec<RelayEndpoint> {
    vec![
        RelayEndpoint::new(
            "local-proxy",
            "http://localhost:8080/",
            SpeedTier::Fast,
            ReliabilityTier::High,
        ),
        RelayEndpoint::new(
            "allorigins",
            "https://api.allorigins.win/raw?url=",
            SpeedTier::Medium,
            ReliabilityTier::High,
        ),
        RelayEndpoint::new(
            "corsproxy-io",
            "https://corsproxy.io/?url=",
            SpeedTier::Fast,
            ReliabilityTier::Medium,
        ),
        RelayEndpoint::new(
            "codetabs",
            "https://api.codetabs.com/v1/proxy?quest=",
            SpeedTier::Medium,
            ReliabilityTier::Medium,
        ),
        RelayEndpoint::new(
            "thingproxy",
            "https://thingproxy.freeboard.io/fetch/",
            SpeedTier::Slow,
            ReliabilityTier::Low,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(name: &str, speed: SpeedTier, reliability: ReliabilityTier) -> RelayEndpoint {
        RelayEndpoint::new(
            name,
            format!("https://{name}.example/raw?url="),
            speed,
            reliability,
        )
    }

    fn local(name: &str) -> RelayEndpoint {
        RelayEndpoint::new(
            name,
            "http://localhost:8080/",
            SpeedTier::Fast,
            ReliabilityTier::High,
        )
    }

    fn online(mut endpoint: RelayEndpoint) -> RelayEndpoint {
        endpoint.health = RelayHealth::Online;
        endpoint
    }

    #[test]
    fn default_directory_has_one_local_relay() {
        let directory = default_directory();
        assert_eq!(directory.iter().filter(|e| e.is_local()).count(), 1);
        assert!(directory.len() >= 4);
    }

    #[test]
    fn selected_empty_before_any_selection() {
        let pool = RelayPool::with_default_directory();
        assert!(pool.selected().is_empty());
    }

    #[test]
    fn auto_select_prefers_online_local() {
        let mut pool = RelayPool::new(vec![
            online(local("local-proxy")),
            online(remote("alpha", SpeedTier::Fast, ReliabilityTier::High)),
            online(remote("beta", SpeedTier::Fast, ReliabilityTier::High)),
        ]);
        pool.auto_select(3);

        let selected = pool.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "local-proxy");
    }

    #[test]
    fn auto_select_skips_offline_local() {
        let mut pool = RelayPool::new(vec![
            local("local-proxy"), // health Unknown, never probed online
            online(remote("alpha", SpeedTier::Fast, ReliabilityTier::High)),
        ]);
        pool.auto_select(3);

        let selected = pool.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "alpha");
    }

    #[test]
    fn auto_select_ranks_remote_by_reliability_then_speed() {
        let mut pool = RelayPool::new(vec![
            online(remote("slow-high", SpeedTier::Slow, ReliabilityTier::High)),
            online(remote("fast-low", SpeedTier::Fast, ReliabilityTier::Low)),
            online(remote("fast-high", SpeedTier::Fast, ReliabilityTier::High)),
            online(remote("fast-medium", SpeedTier::Fast, ReliabilityTier::Medium)),
        ]);
        pool.auto_select(2);

        let names: Vec<String> = pool.selected().into_iter().map(|e| e.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"fast-high".to_string()));
        assert!(names.contains(&"slow-high".to_string()));
    }

    #[test]
    fn auto_select_caps_remote_count() {
        let mut pool = RelayPool::new(vec![
            online(remote("a", SpeedTier::Fast, ReliabilityTier::High)),
            online(remote("b", SpeedTier::Fast, ReliabilityTier::High)),
            online(remote("c", SpeedTier::Fast, ReliabilityTier::High)),
            online(remote("d", SpeedTier::Fast, ReliabilityTier::High)),
        ]);
        pool.auto_select(3);
        assert_eq!(pool.selected().len(), 3);
    }

    #[test]
    fn select_offline_endpoint_rejected() {
        let mut endpoint = remote("alpha", SpeedTier::Fast, ReliabilityTier::High);
        endpoint.health = RelayHealth::Offline;
        let mut pool = RelayPool::new(vec![endpoint]);

        let err = pool.select("alpha").unwrap_err();
        assert!(matches!(err, RankError::RelayOffline(_)));
        assert!(pool.selected().is_empty());
    }

    #[test]
    fn select_unknown_endpoint_rejected() {
        let mut pool = RelayPool::new(vec![]);
        let err = pool.select("nope").unwrap_err();
        assert!(matches!(err, RankError::UnknownRelay(_)));
    }

    #[test]
    fn selecting_local_deselects_remote() {
        let mut pool = RelayPool::new(vec![
            online(local("local-proxy")),
            online(remote("alpha", SpeedTier::Fast, ReliabilityTier::High)),
        ]);
        pool.select("alpha").expect("select remote");
        assert_eq!(pool.selected().len(), 1);

        pool.select("local-proxy").expect("select local");
        let selected = pool.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "local-proxy");
    }

    #[test]
    fn selecting_remote_deselects_local() {
        let mut pool = RelayPool::new(vec![
            online(local("local-proxy")),
            online(remote("alpha", SpeedTier::Fast, ReliabilityTier::High)),
        ]);
        pool.select("local-proxy").expect("select local");
        pool.select("alpha").expect("select remote");

        let selected = pool.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "alpha");
    }

    #[test]
    fn multiple_remote_selections_coexist() {
        let mut pool = RelayPool::new(vec![
            online(remote("alpha", SpeedTier::Fast, ReliabilityTier::High)),
            online(remote("beta", SpeedTier::Medium, ReliabilityTier::Medium)),
        ]);
        pool.select("alpha").expect("select");
        pool.select("beta").expect("select");
        assert_eq!(pool.selected().len(), 2);
    }

    #[test]
    fn deselect_removes_from_candidates() {
        let mut pool = RelayPool::new(vec![online(remote(
            "alpha",
            SpeedTier::Fast,
            ReliabilityTier::High,
        ))]);
        pool.select("alpha").expect("select");
        pool.deselect("alpha").expect("deselect");
        assert!(pool.selected().is_empty());
    }

    #[test]
    fn selected_preserves_stored_order() {
        let mut pool = RelayPool::new(vec![
            online(remote("alpha", SpeedTier::Fast, ReliabilityTier::Low)),
            online(remote("beta", SpeedTier::Fast, ReliabilityTier::High)),
        ]);
        pool.select("beta").expect("select");
        pool.select("alpha").expect("select");

        let names: Vec<String> = pool.selected().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[tokio::test]
    async fn check_all_marks_unreachable_relays_offline() {
        // Port 9 (discard) on loopback refuses connections immediately.
        let mut pool = RelayPool::new(vec![RelayEndpoint::new(
            "unreachable",
            "http://127.0.0.1:9/?url=",
            SpeedTier::Fast,
            ReliabilityTier::High,
        )]);
        let config = RankConfig {
            probe_timeout_secs: 2,
            settle_delay_ms: 0,
            ..Default::default()
        };
        pool.check_all(&config, true, &crate::retry::NoopSleeper)
            .await
            .expect("check_all");

        assert_eq!(pool.endpoints()[0].health, RelayHealth::Offline);
        assert!(pool.selected().is_empty());
    }
}
