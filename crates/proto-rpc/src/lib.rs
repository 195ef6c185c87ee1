//! # Proto RPC - Request/Response Correlation Engine
//!
//! Transport-agnostic RPC over an abstract send hook. Requests get a
//! correlation id and a timer; responses settle the matching call; requests
//! from the peer are dispatched to registered handlers and answered.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  call()   ┌──────────────────┐  send()   ┌───────────┐
//! │ ClientTransport│ ────────▶ │  RpcCommunicator │ ────────▶ │ Transport │
//! └────────────────┘           │  ┌────────────┐  │           └─────┬─────┘
//!                              │  │ Correlation│  │                 │
//!        PendingCall ◀──────── │  │   Table    │  │ ◀───────────────┘
//!                              │  └────────────┘  │  handle_incoming_message()
//!                              │  ServerRegistry  │
//!                              └──────────────────┘
//! ```
//!
//! ## Call Lifecycle
//!
//! Every call settles exactly once: with the response, with a timeout, with a
//! send failure, or with `STOPPED` when the communicator shuts down.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use proto_rpc::{adapters::connect, MethodOptions, RpcCommunicator};
//!
//! let server = RpcCommunicator::new();
//! let client = RpcCommunicator::new();
//! connect(&client, &server, 64);
//!
//! server.register_rpc_method("ping", |n: u32, _ctx| async move { Ok(n + 1) }, MethodOptions::default());
//! let pong: u32 = client.client().request("ping", &1u32, None).await?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod client;
pub mod codec;
pub mod domain;
pub mod ports;
pub mod registry;
pub mod service;

// Re-export main types
pub use adapters::{ChannelTransport, ConfigError};
pub use client::ClientTransport;
pub use codec::{decode_payload, encode_payload, CodecError};
pub use domain::{
    CorrelationStatsSnapshot, CorrelationTable, HandlerError, OngoingRequest, PendingCall,
    ResultHandles, RpcCommunicatorConfig, RpcError, RpcErrorKind,
};
pub use ports::{listener_fn, IncomingMessageHandler, OutgoingMessageListener, TransportError};
pub use registry::{MethodOptions, ServerRegistry};
pub use service::RpcCommunicator;

pub use shared_types::{CallContext, MessageKind, RpcErrorType, RpcMessage};
