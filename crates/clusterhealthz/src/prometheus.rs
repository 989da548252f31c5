//! Prometheus client for fetching the raw `ALERTS` feed.
//!
//! One GET per call, no retries. Failures are classified so the engine can
//! report why a cycle fell back to an unhealthy verdict:
//! - host cannot be resolved: [`FetchError::NameResolution`]
//! - resolved but the request failed or timed out: [`FetchError::Connection`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::error::FetchError;

/// Default Prometheus service address (internal Kubernetes DNS)
pub const DEFAULT_PROMETHEUS_HOST: &str = "service-prometheus.monitoring:9090";

/// Instant query returning every active alert series
const ALERTS_QUERY_PATH: &str = "/api/v1/query?query=ALERTS";

/// Source of the raw alert feed.
#[async_trait]
pub trait AlertFeed: Send + Sync {
    /// URL the feed is read from, for diagnostics.
    fn endpoint(&self) -> &str;

    /// Fetch the raw response body.
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Alert feed backed by the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct PrometheusFeed {
    endpoint: String,
    client: reqwest::Client,
}

impl PrometheusFeed {
    /// Create a feed for `host` (`name[:port]`, no scheme).
    ///
    /// Without a timeout a hung backend blocks the calling request only.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created.
    pub fn new(host: &str, timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("Failed to create HTTP client");

        Self {
            endpoint: alerts_endpoint(host),
            client,
        }
    }

    /// Create a feed for the default in-cluster Prometheus service.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_PROMETHEUS_HOST, None)
    }

    fn parse_endpoint(&self) -> Result<(Url, String, u16), FetchError> {
        let invalid = |reason: String| FetchError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        // IPv6 literals come back bracketed; the resolver wants the bare address
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port".to_string()))?;

        Ok((url, host, port))
    }
}

#[async_trait]
impl AlertFeed for PrometheusFeed {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        let (url, host, port) = self.parse_endpoint()?;

        // Resolved here only to classify DNS failure; reqwest resolves again
        // for the request itself.
        let resolved = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|source| FetchError::NameResolution {
                host: host.clone(),
                source,
            })?
            .next()
            .is_some();
        if !resolved {
            return Err(FetchError::NameResolution {
                host,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no addresses returned",
                ),
            });
        }

        debug!(url = %url, "Querying Prometheus for active alerts");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Connection {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Connection {
            url: url.to_string(),
            source,
        })
    }
}

fn alerts_endpoint(host: &str) -> String {
    let host = host
        .trim()
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("http://{host}{ALERTS_QUERY_PATH}")
}
