//! Flash Relay - per-user ephemeral flash messages over HTTP.
//!
//! One service posts short notices for a user; the user's next read returns
//! them all, oldest first, and clears the queue. Unread notices expire after
//! the retention window.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          FLASH RELAY                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   GET/POST <namespace>/flash          GET <health>/live|ready     │
//! │              │                                  │                 │
//! │  ┌───────────┴──────────────────────────────────┴─────────────┐  │
//! │  │                     Middleware Stack                        │  │
//! │  │  Tracing → Timeout → SensitiveHeaders → BodyLimit → Store   │  │
//! │  └───────────┬─────────────────────────────────────────────────┘  │
//! │              │                                                    │
//! │  ┌───────────┴───────────┐                                        │
//! │  │   Identity (JWT sub)  │  flash routes only, 401 on failure     │
//! │  └───────────┬───────────┘                                        │
//! │              │                                                    │
//! │  ┌───────────┴───────────┐      ┌─────────────────────────────┐   │
//! │  │       Handlers        │ ───→ │  FlashStore port             │   │
//! │  └───────────────────────┘      │  Redis list + TTL | memory   │   │
//! │                                 └─────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flash_relay::{connect_store, FlashRelayService, RelayConfig};
//!
//! let config = RelayConfig::load()?;
//! let store = connect_store(&config.store).await?;
//! FlashRelayService::new(config, store)?
//!     .serve(async { let _ = tokio::signal::ctrl_c().await; })
//!     .await?;
//! ```
//!
//! # Trust model
//!
//! The bearer token's signature is not checked. The relay must sit behind a
//! gateway that has already authenticated the caller.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod service;

// Re-exports for public API
pub use adapters::{connect_store, MemoryFlashStore, RedisFlashStore};
pub use domain::config::{RelayConfig, RetryPolicy, StoreBackend};
pub use domain::error::{ApiError, ApiResult, RelayError, StoreError};
pub use domain::flash::FlashMessage;
pub use domain::identity::{extract_identity, Identity, IdentityError};
pub use ports::FlashStore;
pub use service::FlashRelayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
