//! Health evaluation engine.
//!
//! One cycle runs fetch -> parse -> evaluate -> publish. A failure while
//! fetching or parsing skips straight to publishing `Unhealthy`, so callers of
//! [`HealthEngine::run_cycle`] always get a verdict and never an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::alerts::{self, FiringAlert};
use crate::error::{ConfigError, CycleFailure, FetchError};
use crate::evaluator::{self, HealthVerdict};
use crate::prometheus::{AlertFeed, PrometheusFeed};
use crate::status::{StatusSnapshot, StatusStore};
use crate::watchlist::{self, WatchList, WatchListStore};

/// Settings needed to build a [`HealthEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Watch-list source, already resolved by the caller
    pub config_path: PathBuf,
    /// Prometheus `host[:port]`
    pub prometheus_host: String,
    /// Per-request fetch timeout; `None` keeps the transport default
    pub fetch_timeout: Option<Duration>,
}

/// What one evaluation cycle produced.
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub verdict: HealthVerdict,
    /// Firing alert names, in feed order
    pub firing: Vec<String>,
    /// Set when the cycle could not fetch or decode the feed
    pub failure: Option<CycleFailure>,
}

/// Owns the watch-list, the alert feed and the published verdict.
///
/// Built once at startup and shared behind an `Arc`.
pub struct HealthEngine {
    config_path: PathBuf,
    feed: Arc<dyn AlertFeed>,
    watch_list: WatchListStore,
    status: StatusStore,
    reload_lock: Mutex<()>,
}

impl HealthEngine {
    /// Build an engine reading alerts from Prometheus.
    ///
    /// Fails if the initial watch-list cannot be loaded.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let feed = PrometheusFeed::new(&config.prometheus_host, config.fetch_timeout);
        Self::with_feed(&config.config_path, Arc::new(feed))
    }

    /// Build an engine over any alert feed, loading the watch-list from `config_path`.
    pub fn with_feed(config_path: &Path, feed: Arc<dyn AlertFeed>) -> Result<Self, ConfigError> {
        let watch_list = watchlist::load(config_path)?;
        Ok(Self::with_watch_list(config_path, watch_list, feed))
    }

    /// Build an engine with an already loaded watch-list.
    pub fn with_watch_list(
        config_path: &Path,
        watch_list: WatchList,
        feed: Arc<dyn AlertFeed>,
    ) -> Self {
        info!(
            endpoint = feed.endpoint(),
            alerts = watch_list.len(),
            "Starting ClusterHealthz engine"
        );
        Self {
            config_path: config_path.to_path_buf(),
            feed,
            watch_list: WatchListStore::new(watch_list),
            status: StatusStore::new(),
            reload_lock: Mutex::new(()),
        }
    }

    /// Last published verdict. Does not trigger evaluation.
    pub async fn verdict(&self) -> HealthVerdict {
        self.status.get().await
    }

    /// Last published snapshot. Does not trigger evaluation.
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.status.snapshot().await
    }

    /// Active watch-list.
    pub async fn watch_list(&self) -> Arc<WatchList> {
        self.watch_list.current().await
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Run one evaluation cycle and publish its verdict.
    pub async fn run_cycle(&self) -> EvaluationOutcome {
        let outcome = match self.fetch_and_parse().await {
            Ok(firing) => self.evaluate(&firing).await,
            Err(failure) => {
                log_failure(&failure, self.feed.endpoint());
                EvaluationOutcome {
                    verdict: HealthVerdict::Unhealthy,
                    firing: Vec::new(),
                    failure: Some(failure),
                }
            }
        };

        self.status
            .set(StatusSnapshot {
                verdict: outcome.verdict,
                firing: outcome.firing.clone(),
                failure: outcome.failure.as_ref().map(ToString::to_string),
                evaluated_at: Some(Utc::now()),
            })
            .await;
        debug!(verdict = %outcome.verdict, "Published verdict");

        outcome
    }

    /// Reload the watch-list from the configured source.
    ///
    /// On failure the previous watch-list stays active.
    pub async fn reload(&self) -> Result<Arc<WatchList>, ConfigError> {
        let _guard = self.reload_lock.lock().await;

        let list = watchlist::load(&self.config_path)?;
        self.watch_list.replace(list).await;
        let current = self.watch_list.current().await;

        info!(
            path = %self.config_path.display(),
            alerts = ?current.entries(),
            "Reloaded alert configuration"
        );
        Ok(current)
    }

    async fn fetch_and_parse(&self) -> Result<Vec<FiringAlert>, CycleFailure> {
        debug!(endpoint = self.feed.endpoint(), "Fetching alert feed");
        let raw = self.feed.fetch().await?;

        debug!(bytes = raw.len(), "Parsing alert feed");
        Ok(alerts::parse(&raw)?)
    }

    async fn evaluate(&self, firing: &[FiringAlert]) -> EvaluationOutcome {
        let watch_list = self.watch_list.current().await;
        let verdict = evaluator::evaluate(firing, &watch_list);
        let names: Vec<String> = firing.iter().map(|alert| alert.name.clone()).collect();

        if names.is_empty() {
            info!("No alerts in Prometheus");
        } else if verdict.is_healthy() {
            warn!(
                watch_list = ?watch_list.entries(),
                active = ?names,
                "Alerts found but did not match any watched alert"
            );
        } else {
            warn!(
                impacting = ?evaluator::impacting_alerts(firing, &watch_list),
                active = ?names,
                "Alert condition detected. Setting to unhealthy"
            );
        }

        EvaluationOutcome {
            verdict,
            firing: names,
            failure: None,
        }
    }
}

fn log_failure(failure: &CycleFailure, endpoint: &str) {
    match failure {
        CycleFailure::Fetch(FetchError::NameResolution { host, .. }) => {
            error!(host = %host, error = %failure, "Could not resolve Prometheus in DNS");
        }
        CycleFailure::Fetch(_) => {
            error!(endpoint, error = %failure, "Could not get alerts from Prometheus");
        }
        CycleFailure::Decode(_) => {
            error!(endpoint, error = %failure, "Could not decode the response from Prometheus");
        }
    }
}
