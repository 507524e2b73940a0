//! Pipeline stage 1: attach the shared store handle to the request.

use axum::{body::Body, http::Request, response::Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use super::context::StoreHandle;
use crate::ports::FlashStore;

/// Store layer
#[derive(Clone)]
pub struct StoreLayer {
    store: Arc<dyn FlashStore>,
}

impl StoreLayer {
    pub fn new(store: Arc<dyn FlashStore>) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for StoreLayer {
    type Service = StoreService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StoreService {
            inner,
            store: Arc::clone(&self.store),
        }
    }
}

/// Store service
#[derive(Clone)]
pub struct StoreService<S> {
    inner: S,
    store: Arc<dyn FlashStore>,
}

impl<S> Service<Request<Body>> for StoreService<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        req.extensions_mut()
            .insert(StoreHandle(Arc::clone(&self.store)));
        self.inner.call(req)
    }
}
