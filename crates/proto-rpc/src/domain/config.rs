//! Engine configuration.

use std::time::Duration;

/// Default timeout for a call awaiting a response.
pub const DEFAULT_RPC_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Timeout of short-lived records created only to settle a call.
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default time a registered handler may run before `SERVER_TIMEOUT`.
pub const DEFAULT_METHOD_TIMEOUT: Duration = Duration::from_millis(1000);

/// Floor applied to per-call timeouts taken from a `CallContext`.
pub const MIN_CALL_TIMEOUT: Duration = Duration::from_millis(1);

/// Default capacity of the outgoing-message event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Configuration for an `RpcCommunicator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCommunicatorConfig {
    /// Timeout applied to calls that do not specify one.
    pub rpc_request_timeout: Duration,

    /// Timeout of synthesized records (stopped engine, notifications,
    /// send failures without a registered call).
    pub fallback_timeout: Duration,

    /// Handler timeout for methods registered without their own.
    pub method_timeout: Duration,

    /// Events buffered per subscriber before it lags.
    pub event_capacity: usize,
}

impl Default for RpcCommunicatorConfig {
    fn default() -> Self {
        Self {
            rpc_request_timeout: DEFAULT_RPC_REQUEST_TIMEOUT,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            method_timeout: DEFAULT_METHOD_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RpcCommunicatorConfig {
    /// Set the default call timeout.
    #[must_use]
    pub fn with_rpc_request_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_request_timeout = timeout;
        self
    }

    /// Set the fallback record timeout.
    #[must_use]
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    /// Set the default handler timeout.
    #[must_use]
    pub fn with_method_timeout(mut self, timeout: Duration) -> Self {
        self.method_timeout = timeout;
        self
    }

    /// Set the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc_request_timeout.is_zero() {
            return Err("rpc_request_timeout must be greater than zero".to_string());
        }
        if self.fallback_timeout.is_zero() {
            return Err("fallback_timeout must be greater than zero".to_string());
        }
        if self.method_timeout.is_zero() {
            return Err("method_timeout must be greater than zero".to_string());
        }
        if self.event_capacity == 0 {
            return Err("event_capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}
