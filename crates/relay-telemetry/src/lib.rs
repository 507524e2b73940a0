//! # Relay Telemetry
//!
//! Log setup shared by the Flash Relay binaries and test harnesses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FLASH_SERVICE_NAME` | `flash-relay` | Service name stamped on the startup line |
//! | `FLASH_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directive |
//! | `FLASH_JSON_LOGS` | `true` in containers | One JSON object per line |
//! | `FLASH_LOG_ANSI` | `true` | Colour for plain output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    #[error("failed to install global subscriber: {0}")]
    SubscriberInit(String),
}
