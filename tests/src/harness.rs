//! Test harness: a relay bound to an ephemeral port.

use flash_relay::{FlashRelayService, FlashStore, RelayConfig, RelayError};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A running relay. Call [`RelayHandle::stop`] to shut it down gracefully.
pub struct RelayHandle {
    pub addr: SocketAddr,
    namespace: String,
    health_prefix: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), RelayError>>,
}

impl RelayHandle {
    pub fn flash_url(&self) -> String {
        format!("http://{}{}/flash", self.addr, self.namespace)
    }

    pub fn health_url(&self, check: &str) -> String {
        format!("http://{}{}/{}", self.addr, self.health_prefix, check)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn stop(mut self) -> Result<(), RelayError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.task.await.expect("relay task panicked")
    }
}

/// Spawn a relay on 127.0.0.1 with an OS-assigned port.
pub async fn spawn_relay(config: RelayConfig, store: Arc<dyn FlashStore>) -> RelayHandle {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let namespace = config.http.namespace.clone();
    let health_prefix = config.http.health_prefix.clone();
    let service = FlashRelayService::new(config, store).expect("valid config");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(service.serve_on(listener, async {
        let _ = shutdown_rx.await;
    }));

    RelayHandle {
        addr,
        namespace,
        health_prefix,
        shutdown_tx: Some(shutdown_tx),
        task,
    }
}

/// Mint a bearer token with the given subject. The relay never checks the
/// signature, so any key works.
pub fn token_for(subject: &str) -> String {
    encode(
        &Header::default(),
        &serde_json::json!({ "sub": subject }),
        &EncodingKey::from_secret(b"integration-tests"),
    )
    .expect("encode token")
}
