//! Request timeout middleware.
//!
//! Bounds the whole request, including any store round trips. An expired
//! request is answered with 504; a store mutation already sent to the backend
//! is not rolled back.

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

use crate::domain::ApiError;

/// Timeout layer
#[derive(Clone)]
pub struct TimeoutLayer {
    budget: Duration,
}

impl TimeoutLayer {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            budget: self.budget,
        }
    }
}

/// Timeout service
#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    budget: Duration,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let budget = self.budget;
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let path = req.uri().path().to_owned();
            match timeout(budget, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(path = %path, timeout_ms = budget.as_millis() as u64, "Request timed out");
                    Ok(ApiError::timeout("request timed out").into_response())
                }
            }
        })
    }
}
