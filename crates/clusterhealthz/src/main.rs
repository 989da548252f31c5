//! ClusterHealthz server
//!
//! Serves `/healthz` with `healthy` or `unhealthy` depending on whether any
//! watched Prometheus alert is firing. Send SIGHUP (or POST `/-/reload`) to
//! reload the watch-list.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use clusterhealthz::{reload, EngineConfig, HealthEngine, DEFAULT_PROMETHEUS_HOST};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Cluster health verdict from Prometheus alerts
#[derive(Parser)]
#[command(name = "clusterhealthz")]
#[command(about = "Cluster health verdict from Prometheus alerts")]
#[command(version)]
struct Cli {
    /// Watch-list of cluster-impacting alert names
    #[arg(long, env = "CLUSTERHEALTHZ_CONFIG", default_value = "./config/clusterhealthz.conf")]
    config: PathBuf,

    /// Prometheus host[:port]
    #[arg(long, env = "PROMETHEUS_HOST", default_value = DEFAULT_PROMETHEUS_HOST)]
    prometheus_host: String,

    /// Address to serve HTTP on
    #[arg(long, env = "CLUSTERHEALTHZ_LISTEN", default_value = "0.0.0.0:5000")]
    listen: String,

    /// Timeout for each Prometheus request (transport default if unset)
    #[arg(long, env = "CLUSTERHEALTHZ_FETCH_TIMEOUT_SECS")]
    fetch_timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, env = "CLUSTERHEALTHZ_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose {
        "clusterhealthz=debug,tower_http=debug,info"
    } else {
        "clusterhealthz=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);

    let config = EngineConfig {
        config_path: cli.config,
        prometheus_host: cli.prometheus_host,
        fetch_timeout: cli.fetch_timeout_secs.map(Duration::from_secs),
    };

    let engine = Arc::new(HealthEngine::from_config(&config).with_context(|| {
        format!(
            "Could not load the alert configuration from {}",
            config.config_path.display()
        )
    })?);

    let _sighup = reload::spawn_sighup_listener(Arc::clone(&engine))
        .context("Failed to install the SIGHUP handler")?;

    let app = clusterhealthz::build_router(engine);
    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    info!(addr = %cli.listen, "ClusterHealthz listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("ClusterHealthz stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
