//! SIGHUP-driven watch-list reload.

use std::sync::Arc;

use tokio::task::JoinHandle;
#[cfg(unix)]
use tracing::{error, info};

use crate::engine::HealthEngine;

/// Install a SIGHUP handler and spawn the task serving it.
///
/// Each signal triggers one reload. A failed reload is logged and the
/// previous watch-list stays active; the task never exits on its own.
#[cfg(unix)]
pub fn spawn_sighup_listener(engine: Arc<HealthEngine>) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading the alert configuration");
            if let Err(e) = engine.reload().await {
                error!(
                    path = %engine.config_path().display(),
                    error = %e,
                    "Reload failed, keeping the previous alert configuration"
                );
            }
        }
    }))
}

/// Signals are unavailable; reload stays reachable over HTTP.
#[cfg(not(unix))]
pub fn spawn_sighup_listener(engine: Arc<HealthEngine>) -> std::io::Result<JoinHandle<()>> {
    drop(engine);
    Ok(tokio::spawn(async {}))
}
