//! Service health endpoint.
//!
//! # Design Decisions
//! - Health reflects store reachability, probed on every call
//! - 503 when the store is unreachable so orchestrators stop routing traffic

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub store: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                store: "reachable",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "degraded",
                    version: env!("CARGO_PKG_VERSION"),
                    store: "unreachable",
                }),
            )
        }
    }
}
