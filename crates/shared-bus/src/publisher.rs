//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, RpcEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// The sender lives in an `Option` so that `close()` can drop it, which ends
/// every subscription at once.
pub struct InMemoryEventBus {
    /// Broadcast sender for events. `None` once closed.
    sender: RwLock<Option<broadcast::Sender<RpcEvent>>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Subscribing to a closed bus yields a subscription that is already
    /// closed.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.read().as_ref().map(broadcast::Sender::subscribe);
        let receiver = receiver.unwrap_or_else(|| {
            let (closed, receiver) = broadcast::channel(1);
            drop(closed);
            receiver
        });

        debug!(topics = ?filter.topics, "New subscription created");

        Subscription::new(receiver, filter)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Publish an event to every subscriber.
    ///
    /// Returns the number of active subscribers that received it.
    pub fn emit(&self, event: RpcEvent) -> usize {
        let topic = event.topic();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            trace!(topic = ?topic, "Event dropped (bus closed)");
            return 0;
        };

        match sender.send(event) {
            Ok(receiver_count) => {
                trace!(topic = ?topic, receivers = receiver_count, "Event published");
                receiver_count
            }
            Err(_) => {
                // No receivers - event is dropped
                trace!(topic = ?topic, "Event dropped (no receivers)");
                0
            }
        }
    }

    /// Close the bus, detaching every subscriber.
    ///
    /// Idempotent. Events published afterwards are dropped.
    pub fn close(&self) {
        if self.sender.write().take().is_some() {
            debug!("Event bus closed");
        }
    }

    /// Whether `close()` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Total events published, including those nobody received.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}
