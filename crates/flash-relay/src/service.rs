//! Flash Relay service - router assembly and the HTTP server loop.

use crate::domain::config::RelayConfig;
use crate::domain::error::RelayError;
use crate::handlers::{drain_flashes, enqueue_flashes, liveness, readiness};
use crate::middleware::{IdentityLayer, StoreLayer, TimeoutLayer, TracingLayer};
use crate::ports::FlashStore;
use axum::{extract::DefaultBodyLimit, http::header::AUTHORIZATION, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tracing::info;

/// Flash Relay service state
pub struct FlashRelayService {
    config: RelayConfig,
    store: Arc<dyn FlashStore>,
}

impl FlashRelayService {
    /// Create a new service around an already connected store
    pub fn new(config: RelayConfig, store: Arc<dyn FlashStore>) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self { config, store })
    }

    /// Active configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Build the full router: flash routes, health checks and the shared pipeline
    pub fn router(&self) -> Router {
        let flash = Router::new()
            .route("/flash", get(drain_flashes).post(enqueue_flashes))
            .route_layer(IdentityLayer::new());

        let health = Router::new()
            .route("/live", get(liveness))
            .route("/ready", get(readiness));

        let middleware = ServiceBuilder::new()
            .layer(TracingLayer::new())
            .layer(TimeoutLayer::new(self.config.http.request_timeout))
            .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
            .layer(DefaultBodyLimit::max(self.config.http.max_body_bytes))
            .layer(StoreLayer::new(Arc::clone(&self.store)));

        Router::new()
            .nest(&self.config.http.namespace, flash)
            .nest(&self.config.http.health_prefix, health)
            .layer(middleware)
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener. In-flight requests are allowed
    /// to finish once `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr().map_err(RelayError::Serve)?;
        info!(
            addr = %local_addr,
            namespace = %self.config.http.namespace,
            backend = self.store.backend(),
            "Flash relay listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(RelayError::Serve)?;

        info!("Flash relay stopped");
        Ok(())
    }
}
