//! Request pipeline for the Flash Relay.
//!
//! Layer order (outermost first):
//! Request → Tracing → Timeout → SensitiveHeaders → BodyLimit → Store → Identity → Handler
//!
//! `Identity` is applied only to the flash routes; health checks stop at `Store`.

pub mod auth;
pub mod context;
pub mod store;
pub mod timeout;
pub mod tracing;

pub use auth::IdentityLayer;
pub use context::{RequestContext, StoreHandle};
pub use store::StoreLayer;
pub use timeout::TimeoutLayer;
pub use self::tracing::TracingLayer;
