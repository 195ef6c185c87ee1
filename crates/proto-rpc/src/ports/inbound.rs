//! # Driving Ports (Inbound API)
//!
//! What a transport calls when an envelope arrives.

use async_trait::async_trait;
use shared_types::{CallContext, RpcMessage};

/// Intake for envelopes received from a peer.
///
/// Implemented by `RpcCommunicator`. Transports hold it as
/// `Arc<dyn IncomingMessageHandler>` so they do not depend on the engine.
#[async_trait]
pub trait IncomingMessageHandler: Send + Sync {
    /// Process one received envelope.
    ///
    /// Never fails: responses settle pending calls, requests are answered
    /// through the outbound path, and anything unrecognised is dropped.
    async fn handle_incoming_message(&self, message: RpcMessage, context: Option<CallContext>);
}
