//! Error types for watch-list loading and the alert feed pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a watch-list source.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source could not be opened
    #[error("watch-list source not found at {}: {source}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source opened but reading it failed
    #[error("failed to read watch-list source {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A structured source was not valid YAML/JSON
    #[error("watch-list source {} is not valid YAML/JSON: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The decoded configuration is not a sequence of strings
    #[error("watch-list must be a list of alert names, got {found}")]
    InvalidShape { found: &'static str },
}

/// Errors raised while fetching the raw alert feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend host does not form a usable URL
    #[error("invalid alert feed endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The backend host could not be resolved
    #[error("could not resolve {host}: {source}")]
    NameResolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// The host resolved but the request could not be completed
    #[error("could not get alert data from {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status
    #[error("alert feed {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// The raw feed could not be decoded into firing alerts.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not valid JSON, or the nesting did not match the query response shape
    #[error("malformed alert feed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Valid payload, but the backend reported a failed query
    #[error("alert feed reported status {0:?}")]
    QueryFailed(String),
}

/// Why an evaluation cycle fell back to an unhealthy verdict.
#[derive(Debug, Error)]
pub enum CycleFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
