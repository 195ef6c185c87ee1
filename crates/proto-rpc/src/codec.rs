//! Payload codec.
//!
//! Request and response bodies are bincode-encoded serde values. Both ends of
//! a connection must agree on the payload types per method.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from encoding or decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("Failed to encode payload: {0}")]
    Encode(String),

    /// The bytes are not a valid encoding of the expected type.
    #[error("Failed to decode payload: {0}")]
    Decode(String),
}

/// Encode a payload.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a payload.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
