//! Domain Layer - call lifecycle and correlation, no I/O
//!
//! This module contains:
//! - The error taxonomy (`RpcError`, `HandlerError`)
//! - Engine configuration
//! - Result handles and the caller-side `PendingCall` future
//! - The call lifecycle record (`OngoingRequest`)
//! - The correlation table

pub mod config;
pub mod correlation_table;
pub mod errors;
pub mod handles;
pub mod ongoing_request;

pub use config::*;
pub use correlation_table::*;
pub use errors::*;
pub use handles::*;
pub use ongoing_request::*;
