//! Last published health verdict.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::evaluator::HealthVerdict;

/// Result of the most recent completed evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub verdict: HealthVerdict,
    /// Firing alert names observed by that cycle
    pub firing: Vec<String>,
    /// Why the cycle fell back to `Unhealthy`, if it could not read the feed
    pub failure: Option<String>,
    /// `None` until the first cycle completes
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            verdict: HealthVerdict::Unhealthy,
            firing: Vec::new(),
            failure: None,
            evaluated_at: None,
        }
    }
}

/// Concurrency-safe holder of the current verdict.
///
/// Starts `Unhealthy`. Every `set` replaces the whole snapshot; readers get
/// copies, never the live cell.
#[derive(Debug, Default)]
pub struct StatusStore {
    current: RwLock<Arc<StatusSnapshot>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> HealthVerdict {
        self.current.read().await.verdict
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::clone(&**self.current.read().await)
    }

    pub async fn set(&self, snapshot: StatusSnapshot) {
        *self.current.write().await = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_verdict_is_unhealthy() {
        let store = StatusStore::new();
        assert_eq!(store.get().await, HealthVerdict::Unhealthy);
        let snapshot = store.snapshot().await;
        assert!(snapshot.evaluated_at.is_none());
        assert!(snapshot.failure.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let store = StatusStore::new();
        store
            .set(StatusSnapshot {
                verdict: HealthVerdict::Unhealthy,
                firing: Vec::new(),
                failure: Some("could not resolve prometheus.invalid".to_string()),
                evaluated_at: Some(Utc::now()),
            })
            .await;

        let mut copy = store.snapshot().await;
        copy.verdict = HealthVerdict::Healthy;

        let current = store.snapshot().await;
        assert_eq!(current.verdict, HealthVerdict::Unhealthy);
        assert_eq!(
            current.failure.as_deref(),
            Some("could not resolve prometheus.invalid")
        );
    }

    #[tokio::test]
    async fn test_set_replaces_snapshot() {
        let store = StatusStore::new();
        store
            .set(StatusSnapshot {
                verdict: HealthVerdict::Healthy,
                firing: vec!["ExampleAlertAlwaysFiring".to_string()],
                failure: None,
                evaluated_at: Some(Utc::now()),
            })
            .await;

        assert_eq!(store.get().await, HealthVerdict::Healthy);
        assert_eq!(store.snapshot().await.firing, ["ExampleAlertAlwaysFiring"]);
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_a_whole_snapshot() {
        let store = Arc::new(StatusStore::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let (verdict, firing) = if i % 2 == 0 {
                    (HealthVerdict::Healthy, Vec::new())
                } else {
                    (HealthVerdict::Unhealthy, vec!["KubernetesMasterDown".to_string()])
                };
                store
                    .set(StatusSnapshot {
                        verdict,
                        firing,
                        failure: None,
                        evaluated_at: Some(Utc::now()),
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = store.snapshot().await;
        match snapshot.verdict {
            HealthVerdict::Healthy => assert!(snapshot.firing.is_empty()),
            HealthVerdict::Unhealthy => assert_eq!(snapshot.firing, ["KubernetesMasterDown"]),
        }
    }
}
