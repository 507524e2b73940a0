//! Error conversions from infrastructure types.
//!
//! These conversions involve I/O types and belong in the adapters layer.

use crate::domain::StoreError;

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}
