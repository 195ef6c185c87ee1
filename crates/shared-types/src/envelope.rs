//! # `RpcMessage` Envelope
//!
//! The unit exchanged between two RPC communicators over any transport.
//!
//! ## Header Convention
//!
//! - `request` key present: the message expects to be dispatched to a method.
//! - `request` and `notification` keys present: dispatched, but never answered.
//! - `response` key present: the message answers an earlier request and is
//!   matched purely by `request_id`.
//! - `method` carries the target method name on requests and is echoed on
//!   responses for diagnostics.

use crate::errors::{EnvelopeError, RpcErrorType};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::collections::HashMap;

/// Header key marking a message as a request.
pub const HEADER_REQUEST: &str = "request";
/// Header key marking a request as a notification (no response channel).
pub const HEADER_NOTIFICATION: &str = "notification";
/// Header key marking a message as a response.
pub const HEADER_RESPONSE: &str = "response";
/// Header key carrying the target method name.
pub const HEADER_METHOD: &str = "method";

/// Classification of an envelope by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Expects a response.
    Request,
    /// Dispatched to a method, never answered.
    Notification,
    /// Answers an earlier request.
    Response,
    /// None of the above; ignored by the engine.
    Malformed,
}

/// The correlation-bearing envelope.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcMessage {
    /// String header map; see the module docs for the recognised keys.
    pub header: HashMap<String, String>,

    /// Method-specific payload. Absent on some error responses.
    #[serde_as(as = "Option<Bytes>")]
    pub body: Option<Vec<u8>>,

    /// Caller-generated correlation id, echoed verbatim in the response.
    pub request_id: String,

    /// Present only on error responses.
    pub error_type: Option<RpcErrorType>,

    /// Diagnostic class name of a server-side failure.
    pub error_class_name: Option<String>,

    /// Diagnostic code of a server-side failure.
    pub error_code: Option<String>,

    /// Diagnostic message of a server-side failure.
    pub error_message: Option<String>,
}

impl RpcMessage {
    /// Build a request envelope for `method`.
    #[must_use]
    pub fn request(request_id: impl Into<String>, method: impl Into<String>, body: Vec<u8>) -> Self {
        let mut header = HashMap::new();
        header.insert(HEADER_REQUEST.to_string(), HEADER_REQUEST.to_string());
        header.insert(HEADER_METHOD.to_string(), method.into());
        Self {
            header,
            body: Some(body),
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Build a notification envelope for `method`.
    #[must_use]
    pub fn notification(
        request_id: impl Into<String>,
        method: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        let mut message = Self::request(request_id, method, body);
        message.header.insert(
            HEADER_NOTIFICATION.to_string(),
            HEADER_NOTIFICATION.to_string(),
        );
        message
    }

    /// Build a success response to `request` carrying `body`.
    #[must_use]
    pub fn success_response(request: &RpcMessage, body: Vec<u8>) -> Self {
        let mut response = Self::response_header(request);
        response.body = Some(body);
        response
    }

    /// Build an error response to `request`.
    ///
    /// Diagnostic strings are only meaningful for `ServerError` but are
    /// carried verbatim whatever the error type.
    #[must_use]
    pub fn error_response(
        request: &RpcMessage,
        error_type: RpcErrorType,
        class_name: Option<String>,
        code: Option<String>,
        message: Option<String>,
    ) -> Self {
        let mut response = Self::response_header(request);
        response.error_type = Some(error_type);
        response.error_class_name = class_name;
        response.error_code = code;
        response.error_message = message;
        response
    }

    fn response_header(request: &RpcMessage) -> Self {
        let mut header = HashMap::new();
        header.insert(HEADER_RESPONSE.to_string(), HEADER_RESPONSE.to_string());
        if let Some(method) = request.method() {
            header.insert(HEADER_METHOD.to_string(), method.to_string());
        }
        Self {
            header,
            body: None,
            request_id: request.request_id.clone(),
            ..Self::default()
        }
    }

    /// The target method name, if any. Empty names count as absent.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.header
            .get(HEADER_METHOD)
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Classify the envelope by its header.
    ///
    /// Responses win over requests; requests without a method are malformed.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        if self.header.contains_key(HEADER_RESPONSE) {
            MessageKind::Response
        } else if self.header.contains_key(HEADER_REQUEST) && self.method().is_some() {
            if self.header.contains_key(HEADER_NOTIFICATION) {
                MessageKind::Notification
            } else {
                MessageKind::Request
            }
        } else {
            MessageKind::Malformed
        }
    }

    /// Shorthand for `kind() == MessageKind::Notification`.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.kind() == MessageKind::Notification
    }

    /// Shorthand for `kind() == MessageKind::Response`.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.kind() == MessageKind::Response
    }

    /// Encode the envelope for a byte-oriented transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        bincode::serialize(self).map_err(|e| EnvelopeError::Encode(e.to_string()))
    }

    /// Decode an envelope received from a byte-oriented transport.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        bincode::deserialize(bytes).map_err(|e| EnvelopeError::Decode(e.to_string()))
    }
}
