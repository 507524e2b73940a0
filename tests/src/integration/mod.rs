//! Integration tests against a live listener.

pub mod flash_flows;
pub mod redis_backend;
