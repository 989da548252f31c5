//! HTTP surface for the health verdict.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::engine::HealthEngine;

/// Build the router serving `engine`.
pub fn build_router(engine: Arc<HealthEngine>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/healthz", get(healthz_handler))
        .route("/howsyourfather", get(hows_your_father_handler))
        .route("/status", get(status_handler))
        .route("/-/reload", post(reload_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn root_handler() -> &'static str {
    "You're probably looking for /healthz"
}

async fn hows_your_father_handler() -> &'static str {
    "alright!"
}

/// Run one evaluation cycle and return the verdict as plain text.
async fn healthz_handler(State(engine): State<Arc<HealthEngine>>) -> &'static str {
    engine.run_cycle().await.verdict.as_str()
}

/// Last published snapshot, without re-evaluating.
async fn status_handler(State(engine): State<Arc<HealthEngine>>) -> impl IntoResponse {
    Json(engine.snapshot().await)
}

/// Response for reload requests.
#[derive(Debug, Serialize)]
struct ReloadResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn reload_handler(State(engine): State<Arc<HealthEngine>>) -> impl IntoResponse {
    match engine.reload().await {
        Ok(list) => (
            StatusCode::OK,
            Json(ReloadResponse {
                status: "ok",
                alerts: Some(list.entries().to_vec()),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Reload failed, keeping the previous alert configuration");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ReloadResponse {
                    status: "error",
                    alerts: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
