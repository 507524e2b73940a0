//! Outbound ports for the Flash Relay.

use async_trait::async_trait;

use crate::domain::{FlashMessage, Identity, StoreError};

/// Per-identity flash queue backed by a shared key-value store.
///
/// One instance is built at startup and shared as `Arc<dyn FlashStore>` by
/// every in-flight request, so implementations must be safe for concurrent
/// use and must not hold a process-local lock across a backend call.
#[async_trait]
pub trait FlashStore: Send + Sync {
    /// Append `messages` to the tail of the identity's queue and reset its
    /// expiry to the retention window, as one indivisible step.
    async fn enqueue(&self, identity: &Identity, messages: &[FlashMessage])
        -> Result<(), StoreError>;

    /// Read the whole queue in FIFO order and delete it, atomically.
    /// An absent queue yields an empty vector.
    async fn drain_and_clear(&self, identity: &Identity) -> Result<Vec<FlashMessage>, StoreError>;

    /// Cheap round trip to the backend, for readiness.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for log fields.
    fn backend(&self) -> &'static str;
}

/// Store that fails every call.
#[cfg(test)]
pub struct FailingStore {
    pub error: StoreError,
}

#[cfg(test)]
impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self { error }
    }
}

#[cfg(test)]
#[async_trait]
impl FlashStore for FailingStore {
    async fn enqueue(&self, _: &Identity, _: &[FlashMessage]) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    async fn drain_and_clear(&self, _: &Identity) -> Result<Vec<FlashMessage>, StoreError> {
        Err(self.error.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}
