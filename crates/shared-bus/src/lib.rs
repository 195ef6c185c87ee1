//! # Shared Bus - Outgoing Message Events
//!
//! Broadcasts every envelope an RPC communicator hands to its transport, so
//! that any number of observers (transport adapters, tracers, tests) can
//! subscribe without the engine knowing about them.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌────────────┐
//! │ Communicator │ ────────────▶ │  Event Bus   │ ────────────▶ │  Observer  │
//! └──────────────┘               └──────────────┘               └────────────┘
//! ```
//!
//! Closing the bus detaches every subscriber: pending `recv()` calls return
//! `None` and streams end.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, RpcEvent};
pub use publisher::InMemoryEventBus;
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
