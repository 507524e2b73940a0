//! # Flash Relay
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load and validate configuration (file, then env)
//! 3. Connect the queue store
//! 4. Serve until SIGINT/SIGTERM, letting in-flight requests finish

use anyhow::{Context, Result};
use flash_relay::{connect_store, FlashRelayService, RelayConfig, VERSION};
use relay_telemetry::{init_logging, TelemetryConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("failed to initialize logging")?;

    // Load configuration
    let config = RelayConfig::load().context("invalid configuration")?;
    info!(
        version = VERSION,
        addr = %config.http_addr(),
        backend = ?config.store.backend,
        retention_secs = config.store.retention.as_secs(),
        "Starting flash relay"
    );

    let store = connect_store(&config.store)
        .await
        .context("failed to connect flash store")?;

    FlashRelayService::new(config, store)?
        .serve(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
