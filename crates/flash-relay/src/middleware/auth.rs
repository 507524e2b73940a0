//! Pipeline stages 2 and 3: resolve the caller identity and attach the
//! request context.
//!
//! Any extraction failure ends the request here with a bare 401; neither
//! the handler nor the store is touched.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    response::{IntoResponse, Response},
};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error, Span};

use super::context::{RequestContext, StoreHandle};
use crate::domain::{extract_identity, ApiError};

/// Identity layer
#[derive(Clone, Default)]
pub struct IdentityLayer;

impl IdentityLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityService { inner }
    }
}

/// Identity service
#[derive(Clone)]
pub struct IdentityService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for IdentityService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let identity = match extract_identity(req.headers().get(AUTHORIZATION)) {
                Ok(identity) => identity,
                Err(e) => {
                    debug!(reason = %e, path = %req.uri().path(), "Rejecting unauthenticated request");
                    return Ok(ApiError::unauthorized().into_response());
                }
            };

            let Some(StoreHandle(store)) = req.extensions().get::<StoreHandle>().cloned() else {
                error!("store handle missing; StoreLayer must wrap IdentityLayer");
                return Ok(ApiError::internal("internal error").into_response());
            };

            Span::current().record("identity", identity.as_str());
            req.extensions_mut()
                .insert(RequestContext { store, identity });

            inner.call(req).await
        })
    }
}
