//! Cluster health verdict from Prometheus alerts.
//!
//! The service answers one question: is any alert on the operator's
//! watch-list currently firing? Every health query fetches the Prometheus
//! `ALERTS` feed, decodes it and compares the firing alert names with the
//! watch-list. Anything that prevents a confident answer (DNS failure,
//! connection failure, malformed feed) reads as `unhealthy`.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use clusterhealthz::{EngineConfig, HealthEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Arc::new(HealthEngine::from_config(&EngineConfig {
//!     config_path: "./config/clusterhealthz.conf".into(),
//!     prometheus_host: clusterhealthz::DEFAULT_PROMETHEUS_HOST.to_string(),
//!     fetch_timeout: None,
//! })?);
//!
//! let outcome = engine.run_cycle().await;
//! println!("{}", outcome.verdict);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`watchlist`] loads and stores the watch-list
//! - [`prometheus`] fetches the raw feed ([`AlertFeed`] trait)
//! - [`alerts`] decodes the feed into [`FiringAlert`]s
//! - [`evaluator`] is the pure health policy
//! - [`status`] holds the last published verdict
//! - [`engine`] runs cycles and reloads
//! - [`server`] and [`reload`] are the HTTP and SIGHUP entry points

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alerts;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod prometheus;
pub mod reload;
pub mod server;
pub mod status;
pub mod watchlist;

pub use alerts::FiringAlert;
pub use engine::{EngineConfig, EvaluationOutcome, HealthEngine};
pub use error::{ConfigError, CycleFailure, DecodeError, FetchError};
pub use evaluator::{evaluate, HealthVerdict};
pub use prometheus::{AlertFeed, PrometheusFeed, DEFAULT_PROMETHEUS_HOST};
pub use server::build_router;
pub use status::{StatusSnapshot, StatusStore};
pub use watchlist::{WatchList, WatchListStore};
