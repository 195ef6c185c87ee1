//! Domain Errors for the RPC engine
//!
//! `RpcError` is what a caller's pending call rejects with. `HandlerError` is
//! what a registered method reports back to the engine, before it is
//! downgraded to the wire taxonomy.

use crate::codec::CodecError;
use shared_types::{RpcErrorType, RpcMessage};
use std::fmt;
use thiserror::Error;

/// Class name attached to request payloads that fail to decode.
pub const FAILED_TO_PARSE: &str = "FailedToParse";

/// Classification of every failure a call can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorKind {
    /// Remote handler could not finish in time.
    ServerTimeout,
    /// Local timer fired before any response arrived.
    ClientTimeout,
    /// Remote has no handler for the method.
    UnknownRpcMethod,
    /// Local failure before or while sending.
    ClientError,
    /// Handler failed, or the response body failed to parse.
    ServerError,
    /// The communicator was shut down.
    Stopped,
}

impl RpcErrorKind {
    /// Stable label, used for logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerTimeout => "SERVER_TIMEOUT",
            Self::ClientTimeout => "CLIENT_TIMEOUT",
            Self::UnknownRpcMethod => "UNKNOWN_RPC_METHOD",
            Self::ClientError => "CLIENT_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for RpcErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single rejection value of a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Our own timer fired.
    #[error("Rpc request timed out")]
    ClientTimeout,

    /// The peer reported its handler timed out.
    #[error("Server timed out on request")]
    ServerTimeout,

    /// The peer has no handler for `method`.
    #[error("Server does not implement method {method}")]
    UnknownRpcMethod {
        /// Method name echoed in the response header.
        method: String,
    },

    /// Sending failed, or the caller reported an error.
    #[error("{0}")]
    ClientError(String),

    /// The caller cancelled the call.
    #[error("Rpc request cancelled")]
    Cancelled,

    /// The peer's handler failed.
    #[error("{message}")]
    ServerError {
        /// Diagnostic message from the peer.
        message: String,
        /// Diagnostic class name from the peer.
        class_name: Option<String>,
        /// Diagnostic code from the peer.
        code: Option<String>,
    },

    /// The response body could not be parsed.
    #[error("Failed to parse received response, network protocol version is likely incompatible: {0}")]
    FailedToParse(String),

    /// The communicator was stopped.
    #[error("RpcCommunicator is stopped")]
    Stopped,
}

impl RpcError {
    /// The taxonomy kind of this failure.
    #[must_use]
    pub fn kind(&self) -> RpcErrorKind {
        match self {
            Self::ClientTimeout => RpcErrorKind::ClientTimeout,
            Self::ServerTimeout => RpcErrorKind::ServerTimeout,
            Self::UnknownRpcMethod { .. } => RpcErrorKind::UnknownRpcMethod,
            Self::ClientError(_) | Self::Cancelled => RpcErrorKind::ClientError,
            Self::ServerError { .. } | Self::FailedToParse(_) => RpcErrorKind::ServerError,
            Self::Stopped => RpcErrorKind::Stopped,
        }
    }

    /// Build the rejection for an error response.
    ///
    /// Returns `None` when the response carries no `error_type`. Error types
    /// a server never sends (`CLIENT_TIMEOUT`, `CLIENT_ERROR`) surface as a
    /// generic server error.
    #[must_use]
    pub fn from_response(response: &RpcMessage) -> Option<Self> {
        let error = match response.error_type? {
            RpcErrorType::ServerTimeout => Self::ServerTimeout,
            RpcErrorType::UnknownRpcMethod => Self::UnknownRpcMethod {
                method: response.method().unwrap_or_default().to_string(),
            },
            RpcErrorType::ServerError => Self::ServerError {
                message: response.error_message.clone().unwrap_or_default(),
                class_name: response.error_class_name.clone(),
                code: response.error_code.clone(),
            },
            RpcErrorType::ClientTimeout | RpcErrorType::ClientError => Self::ServerError {
                message: "Unknown RPC Error".to_string(),
                class_name: None,
                code: None,
            },
        };
        Some(error)
    }
}

/// Failure reported by a registered handler or by the registry itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// No handler is registered under this name.
    #[error("Unknown RPC method: {0}")]
    UnknownMethod(String),

    /// The handler did not finish within its timeout.
    #[error("Method {method} timed out after {timeout_ms}ms")]
    Timeout {
        /// Method name.
        method: String,
        /// Timeout that expired.
        timeout_ms: u64,
    },

    /// The handler failed.
    #[error("{message}")]
    Failed {
        /// Diagnostic class name.
        class_name: Option<String>,
        /// Diagnostic code.
        code: Option<String>,
        /// Diagnostic message.
        message: String,
    },
}

impl HandlerError {
    /// A plain handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            class_name: None,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a diagnostic code. No effect on other variants.
    #[must_use]
    pub fn with_code(mut self, value: impl Into<String>) -> Self {
        if let Self::Failed { code, .. } = &mut self {
            *code = Some(value.into());
        }
        self
    }

    /// Attach a diagnostic class name. No effect on other variants.
    #[must_use]
    pub fn with_class_name(mut self, value: impl Into<String>) -> Self {
        if let Self::Failed { class_name, .. } = &mut self {
            *class_name = Some(value.into());
        }
        self
    }

    /// Wire error type this failure is downgraded to.
    #[must_use]
    pub fn error_type(&self) -> RpcErrorType {
        match self {
            Self::UnknownMethod(_) => RpcErrorType::UnknownRpcMethod,
            Self::Timeout { .. } => RpcErrorType::ServerTimeout,
            Self::Failed { .. } => RpcErrorType::ServerError,
        }
    }

    /// Build the error response answering `request`.
    ///
    /// Diagnostics are only carried for `SERVER_ERROR`.
    #[must_use]
    pub fn to_response(&self, request: &RpcMessage) -> RpcMessage {
        match self {
            Self::Failed {
                class_name,
                code,
                message,
            } => RpcMessage::error_response(
                request,
                RpcErrorType::ServerError,
                class_name.clone(),
                code.clone(),
                Some(message.clone()).filter(|m| !m.is_empty()),
            ),
            other => RpcMessage::error_response(request, other.error_type(), None, None, None),
        }
    }
}

impl From<CodecError> for HandlerError {
    fn from(err: CodecError) -> Self {
        Self::failed(err.to_string()).with_class_name(FAILED_TO_PARSE)
    }
}
