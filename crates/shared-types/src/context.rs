//! # Call Context
//!
//! Options that accompany a call from the client layer through the engine
//! into the transport. Transports may read `metadata` (for instance to find
//! the target peer); the engine only reads `timeout_ms` and `notification`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Caller-supplied timeout in milliseconds. `None` uses the engine default.
    pub timeout_ms: Option<u64>,

    /// The call expects no response.
    pub notification: bool,

    /// Free-form transport hints.
    pub metadata: HashMap<String, String>,
}

impl CallContext {
    /// Empty context: default timeout, expects a response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a notification.
    #[must_use]
    pub fn for_notification() -> Self {
        Self {
            notification: true,
            ..Self::default()
        }
    }

    /// Override the call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Attach a transport hint.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The caller-supplied timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Look up a transport hint.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
