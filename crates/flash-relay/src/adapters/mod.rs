//! Adapters for the Flash Relay.
//!
//! Store implementations behind the `FlashStore` port, plus the startup
//! factory that picks one from configuration.

pub mod error_conversions;
pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryFlashStore;
pub use redis_store::RedisFlashStore;

use std::sync::Arc;
use tracing::info;

use crate::domain::{StoreBackend, StoreConfig, StoreError};
use crate::ports::FlashStore;

/// Build the store named by `config.backend`. Called once at startup; the
/// returned handle is shared by every request.
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn FlashStore>, StoreError> {
    let store: Arc<dyn FlashStore> = match config.backend {
        StoreBackend::Redis => Arc::new(RedisFlashStore::connect(config).await?),
        StoreBackend::Memory => {
            let store = Arc::new(MemoryFlashStore::new(config.retention, config.retry));
            // Sweep once per retention window; the task ends with the store.
            store.spawn_sweeper(config.retention);
            store
        }
    };
    info!(backend = store.backend(), "Flash store ready");
    Ok(store)
}
