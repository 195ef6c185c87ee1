//! # Proto-RPC Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # DHT-style payloads and connected peer pairs
//! │
//! └── integration/      # End-to-end flows between two communicators
//!     ├── round_trip.rs
//!     ├── timeouts.rs
//!     ├── notifications.rs
//!     ├── errors.rs
//!     ├── shutdown.rs
//!     └── transport.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p rpc-tests
//!
//! # By category
//! cargo test -p rpc-tests integration::timeouts::
//!
//! # Benchmarks
//! cargo bench -p rpc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
