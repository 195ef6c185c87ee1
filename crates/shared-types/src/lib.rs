//! # Shared Types Crate
//!
//! This crate contains the wire-level types exchanged between two RPC
//! communicators: the `RpcMessage` envelope, the `RpcErrorType` carried on
//! error responses, and the `CallContext` options that travel alongside a
//! call through the engine and the transport adapters.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every crate that touches an envelope uses
//!   the definitions in this crate.
//! - **Caller-Owned Correlation**: The `request_id` is generated by the
//!   caller side and echoed verbatim in responses. Nothing in this crate
//!   generates one.
//! - **Header Classification**: A message is a request, notification or
//!   response purely by its header keys; see [`MessageKind`].

pub mod context;
pub mod envelope;
pub mod errors;

pub use context::CallContext;
pub use envelope::{MessageKind, RpcMessage};
pub use errors::{EnvelopeError, RpcErrorType};
