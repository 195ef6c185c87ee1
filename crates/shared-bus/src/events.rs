//! # RPC Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{CallContext, RpcMessage};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpcEvent {
    /// An envelope was handed to the transport layer.
    ///
    /// Emitted for requests, notifications and responses alike.
    OutgoingMessage {
        /// The envelope to deliver.
        message: RpcMessage,
        /// Correlation id of the envelope (same as `message.request_id`).
        request_id: String,
        /// Options the call was issued with, if any.
        context: Option<CallContext>,
    },

    /// The communicator was stopped. Last event before the bus closes.
    Stopped,
}

impl RpcEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::OutgoingMessage { .. } => EventTopic::OutgoingMessage,
            Self::Stopped => EventTopic::Lifecycle,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Envelopes leaving the communicator.
    OutgoingMessage,
    /// Communicator lifecycle changes.
    Lifecycle,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Shorthand for the outgoing message topic.
    #[must_use]
    pub fn outgoing() -> Self {
        Self::topics(vec![EventTopic::OutgoingMessage])
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &RpcEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
