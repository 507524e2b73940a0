//! Flash message model and its storage encoding.
//!
//! Each message is stored as one compact JSON object per queue entry.
//! `serde_json` escapes control characters, so entries never contain a raw
//! newline.

use serde::{Deserialize, Serialize};

use crate::domain::error::StoreError;

/// A short-lived, one-time-delivery notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlashMessage {
    /// Short classification string (`info`, `error`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form text
    pub content: String,
}

impl FlashMessage {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }

    /// Encode as a single queue entry.
    pub fn encode(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Decode a single queue entry.
    pub fn decode(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

/// Encode a batch, preserving order.
pub fn encode_batch(messages: &[FlashMessage]) -> Result<Vec<String>, StoreError> {
    messages.iter().map(FlashMessage::encode).collect()
}

/// Decode stored entries in order. Any bad entry fails the whole batch.
pub fn decode_entries<T: AsRef<[u8]>>(raw: &[T]) -> Result<Vec<FlashMessage>, StoreError> {
    raw.iter()
        .enumerate()
        .map(|(index, entry)| {
            FlashMessage::decode(entry.as_ref()).map_err(|e| StoreError::CorruptEntry {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
