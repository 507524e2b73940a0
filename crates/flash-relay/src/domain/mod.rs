//! Domain types for the Flash Relay.
//!
//! Pure types and codecs: configuration, errors, the flash message model and
//! caller identity. Nothing here touches the network.

pub mod config;
pub mod error;
pub mod flash;
pub mod identity;

// Re-exports for convenience
pub use config::{ConfigError, HttpConfig, RelayConfig, RetryPolicy, StoreBackend, StoreConfig};
pub use error::{ApiError, ApiResult, RelayError, StoreError};
pub use flash::{decode_entries, encode_batch, FlashMessage};
pub use identity::{extract_identity, Identity, IdentityError, QUEUE_KEY_PREFIX};
