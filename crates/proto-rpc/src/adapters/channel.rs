//! In-process channel transport.
//!
//! Envelopes are encoded to bytes and carried over a bounded `mpsc` channel,
//! so the full codec path is exercised without sockets. Used by tests, demos
//! and benchmarks.

use crate::ports::{IncomingMessageHandler, OutgoingMessageListener, TransportError};
use crate::service::RpcCommunicator;
use async_trait::async_trait;
use shared_types::{CallContext, RpcMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Send hook writing encoded envelopes into a channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    /// Wrap an existing sender.
    #[must_use]
    pub fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self { sender }
    }

    /// Create a transport and the receiving end of its channel.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl OutgoingMessageListener for ChannelTransport {
    async fn send(
        &self,
        message: &RpcMessage,
        _request_id: &str,
        _context: Option<&CallContext>,
    ) -> Result<(), TransportError> {
        let bytes = message
            .to_bytes()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        self.sender
            .send(bytes)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// Decode envelopes from `receiver` and feed them to `handler`.
///
/// Each envelope is handled on its own task, so a slow handler does not hold
/// up responses queued behind it. `context` is attached to every envelope.
/// The pump ends when all senders are dropped.
pub fn spawn_inbound_pump(
    mut receiver: mpsc::Receiver<Vec<u8>>,
    handler: Arc<dyn IncomingMessageHandler>,
    context: Option<CallContext>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(bytes) = receiver.recv().await {
            match RpcMessage::from_bytes(&bytes) {
                Ok(message) => {
                    let handler = Arc::clone(&handler);
                    let context = context.clone();
                    tokio::spawn(async move {
                        handler.handle_incoming_message(message, context).await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, len = bytes.len(), "Dropping undecodable envelope");
                }
            }
        }
        debug!("Inbound pump finished");
    })
}

/// Wire two communicators to each other.
///
/// Installs a [`ChannelTransport`] on both and starts both inbound pumps.
/// The pumps end once both communicators have been stopped.
pub fn connect(
    a: &RpcCommunicator,
    b: &RpcCommunicator,
    capacity: usize,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let (a_to_b, b_inbox) = ChannelTransport::channel(capacity);
    let (b_to_a, a_inbox) = ChannelTransport::channel(capacity);

    a.set_outgoing_message_listener(a_to_b);
    b.set_outgoing_message_listener(b_to_a);

    let a_pump = spawn_inbound_pump(a_inbox, Arc::new(a.clone()), None);
    let b_pump = spawn_inbound_pump(b_inbox, Arc::new(b.clone()), None);
    (a_pump, b_pump)
}
