//! # Error Types
//!
//! The error taxonomy that travels on the wire, plus envelope codec errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error classification carried on error responses.
///
/// There is no `STOPPED` variant; shutdown is observed locally and never put
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcErrorType {
    /// The remote handler reported it could not finish in time.
    ServerTimeout,
    /// The caller's own timer fired.
    ClientTimeout,
    /// The remote has no handler registered for the method.
    UnknownRpcMethod,
    /// The caller failed before or while sending.
    ClientError,
    /// The remote handler failed.
    ServerError,
}

impl fmt::Display for RpcErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerTimeout => write!(f, "SERVER_TIMEOUT"),
            Self::ClientTimeout => write!(f, "CLIENT_TIMEOUT"),
            Self::UnknownRpcMethod => write!(f, "UNKNOWN_RPC_METHOD"),
            Self::ClientError => write!(f, "CLIENT_ERROR"),
            Self::ServerError => write!(f, "SERVER_ERROR"),
        }
    }
}

/// Errors from encoding or decoding an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The envelope could not be serialized.
    #[error("Failed to encode envelope: {0}")]
    Encode(String),

    /// The bytes are not a valid envelope.
    #[error("Failed to decode envelope: {0}")]
    Decode(String),
}
