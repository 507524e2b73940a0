//! Flash endpoints: enqueue and drain for the caller's identity.
//!
//! Store failures are logged with identity, operation and cause, then
//! surfaced as a fixed 500. Handlers never retry and never patch up state.

use axum::{http::StatusCode, Json};
use bytes::Bytes;
use tracing::{debug, error};

use crate::domain::{ApiError, ApiResult, FlashMessage};
use crate::middleware::RequestContext;

/// `POST /<namespace>/flash` - body is a JSON array of `{type, content}`.
pub async fn enqueue_flashes(ctx: RequestContext, body: Bytes) -> ApiResult<StatusCode> {
    let messages: Vec<FlashMessage> = serde_json::from_slice(&body).map_err(|e| {
        debug!(identity = %ctx.identity, error = %e, "Rejecting malformed flash batch");
        ApiError::bad_request("invalid request")
    })?;

    ctx.store
        .enqueue(&ctx.identity, &messages)
        .await
        .map_err(|e| {
            error!(
                identity = %ctx.identity,
                op = "enqueue",
                backend = ctx.store.backend(),
                count = messages.len(),
                error = %e,
                "Failed to save flash messages"
            );
            ApiError::internal("failed to save messages")
        })?;

    debug!(identity = %ctx.identity, count = messages.len(), "Enqueued flash messages");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /<namespace>/flash` - returns and clears the caller's queue.
pub async fn drain_flashes(ctx: RequestContext) -> ApiResult<Json<Vec<FlashMessage>>> {
    let messages = ctx
        .store
        .drain_and_clear(&ctx.identity)
        .await
        .map_err(|e| {
            error!(
                identity = %ctx.identity,
                op = "drain",
                backend = ctx.store.backend(),
                error = %e,
                "Failed to read and delete flash messages"
            );
            ApiError::internal("failed to read and delete messages")
        })?;

    debug!(identity = %ctx.identity, count = messages.len(), "Drained flash messages");
    Ok(Json(messages))
}
