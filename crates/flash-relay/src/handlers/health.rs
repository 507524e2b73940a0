//! Liveness and readiness checks.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::warn;

use crate::middleware::StoreHandle;

/// Liveness: the process is up. Never consults the store.
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "UP" }))
}

/// Readiness: the store answers a ping.
pub async fn readiness(StoreHandle(store): StoreHandle) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "UP" }))),
        Err(e) => {
            warn!(backend = store.backend(), error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "DOWN",
                    "message": "store connection failed"
                })),
            )
        }
    }
}
