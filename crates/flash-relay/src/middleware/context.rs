//! Typed per-request context.
//!
//! The pipeline stores these in request extensions; handlers pull them out
//! with the extractors below instead of reaching for globals.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::fmt;
use std::sync::Arc;
use tracing::error;

use crate::domain::{ApiError, Identity};
use crate::ports::FlashStore;

/// Shared store handle attached to every request.
#[derive(Clone)]
pub struct StoreHandle(pub Arc<dyn FlashStore>);

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreHandle").field(&self.0.backend()).finish()
    }
}

/// Everything an authenticated handler needs.
#[derive(Clone)]
pub struct RequestContext {
    pub store: Arc<dyn FlashStore>,
    pub identity: Identity,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("store", &self.store.backend())
            .field("identity", &self.identity)
            .finish()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for StoreHandle
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<StoreHandle>().cloned().ok_or_else(|| {
            error!(path = %parts.uri.path(), "store handle missing; StoreLayer not installed");
            ApiError::internal("internal error")
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().ok_or_else(|| {
            error!(path = %parts.uri.path(), "request context missing; IdentityLayer not installed");
            ApiError::internal("internal error")
        })
    }
}
