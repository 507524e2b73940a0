//! # Flash Relay Test Suite
//!
//! End-to-end tests that drive a real listener over HTTP.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Spawn a relay on 127.0.0.1:0, mint tokens
//! └── integration/
//!     ├── flash_flows.rs    # Enqueue/drain, auth, validation, health checks, shutdown
//!     ├── concurrency.rs    # Racing producers and drainers
//!     └── redis_backend.rs  # Same flows against Redis (ignored by default)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p flash-tests
//!
//! # Redis flows (needs a disposable server)
//! FLASH_TEST_REDIS_URL=redis://127.0.0.1:6379/15 cargo test -p flash-tests -- --ignored
//! ```

pub mod harness;
pub mod integration;
