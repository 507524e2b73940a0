//! Ports (hexagonal boundaries) for the Flash Relay.

pub mod outbound;

pub use outbound::FlashStore;
