//! Health policy: firing alerts + watch-list -> verdict.

use std::fmt;

use serde::Serialize;

use crate::alerts::FiringAlert;
use crate::watchlist::WatchList;

/// Binary cluster health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthVerdict {
    /// No watched alert is firing
    Healthy,
    /// A watched alert is firing, or the feed could not be read
    Unhealthy,
}

impl HealthVerdict {
    /// Wire representation returned by the health endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }

    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide cluster health.
///
/// Unhealthy if and only if at least one firing alert is on the watch-list.
pub fn evaluate(firing: &[FiringAlert], watch_list: &WatchList) -> HealthVerdict {
    if firing.iter().any(|alert| watch_list.contains(&alert.name)) {
        HealthVerdict::Unhealthy
    } else {
        HealthVerdict::Healthy
    }
}

/// Names of firing alerts that are on the watch-list, de-duplicated, in feed order.
pub fn impacting_alerts<'a>(firing: &'a [FiringAlert], watch_list: &WatchList) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for alert in firing {
        if watch_list.contains(&alert.name) && !names.contains(&alert.name.as_str()) {
            names.push(&alert.name);
        }
    }
    names
}
