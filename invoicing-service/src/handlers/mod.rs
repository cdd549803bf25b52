pub mod invoices;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;
use crate::AppState;

/// Liveness probe. Reports the store as degraded without failing the probe.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = match state.service.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Store ping failed");
            "unavailable"
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "invoicing-service",
            "version": env!("CARGO_PKG_VERSION"),
            "store": store,
        })),
    )
}

/// Readiness probe. Not ready until the store answers.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready" })),
            )
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
