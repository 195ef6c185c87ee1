//! # Driven Ports (Outbound SPI)
//!
//! The send hook a transport plugs into the engine.

use async_trait::async_trait;
use shared_types::{CallContext, RpcMessage};
use std::future::Future;
use thiserror::Error;

/// Async send hook for outgoing envelopes.
///
/// Set once on the communicator. When present, a call is only considered
/// handed to the transport after `send` returns `Ok`, and a send failure
/// settles the call with `CLIENT_ERROR`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine calls `send` from many
/// tasks at once.
#[async_trait]
pub trait OutgoingMessageListener: Send + Sync {
    /// Deliver one envelope.
    ///
    /// # Arguments
    ///
    /// * `message` - The envelope (request, notification or response)
    /// * `request_id` - Its correlation id
    /// * `context` - Options the call was issued with, if any
    async fn send(
        &self,
        message: &RpcMessage,
        request_id: &str,
        context: Option<&CallContext>,
    ) -> Result<(), TransportError>;
}

/// Errors from the send hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport refused or failed to deliver the envelope.
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// The transport is closed.
    #[error("Transport closed")]
    Closed,

    /// The envelope could not be encoded for the transport.
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

/// Send hook backed by a closure.
pub struct FnListener<F> {
    send: F,
}

/// Wrap a closure as an [`OutgoingMessageListener`].
///
/// ```rust,ignore
/// communicator.set_outgoing_message_listener(listener_fn(|message, _id, _ctx| async move {
///     socket.send(message.to_bytes()?).await
/// }));
/// ```
pub fn listener_fn<F, Fut>(send: F) -> FnListener<F>
where
    F: Fn(RpcMessage, String, Option<CallContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    FnListener { send }
}

#[async_trait]
impl<F, Fut> OutgoingMessageListener for FnListener<F>
where
    F: Fn(RpcMessage, String, Option<CallContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    async fn send(
        &self,
        message: &RpcMessage,
        request_id: &str,
        context: Option<&CallContext>,
    ) -> Result<(), TransportError> {
        (self.send)(message.clone(), request_id.to_string(), context.cloned()).await
    }
}
