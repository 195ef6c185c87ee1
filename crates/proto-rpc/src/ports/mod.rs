//! # Ports Layer
//!
//! - **Driving Port (Inbound):** envelopes arriving from a transport
//! - **Driven Port (Outbound):** the send hook a transport implements

pub mod inbound;
pub mod outbound;

pub use inbound::IncomingMessageHandler;
pub use outbound::{listener_fn, FnListener, OutgoingMessageListener, TransportError};
