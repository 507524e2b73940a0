//! HTTP handlers.

pub mod flash;
pub mod health;

pub use flash::{drain_flashes, enqueue_flashes};
pub use health::{liveness, readiness};
