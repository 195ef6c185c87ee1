//! # RPC Communicator Service
//!
//! Wires the correlation table, the server registry, the event bus and the
//! send hook together.
//!
//! ## Outbound
//!
//! `handle_outgoing_call` registers a pending call (unless it is a
//! notification), publishes the envelope as an event and awaits the send hook.
//! A send failure settles the call with `CLIENT_ERROR`; a notification settles
//! successfully once the hook returns.
//!
//! ## Inbound
//!
//! `handle_incoming_message` settles pending calls from responses and answers
//! requests through the outbound path, without registering a call.
//!
//! ## Shutdown
//!
//! `stop` rejects every pending call with `STOPPED` and detaches all
//! subscribers. Both paths are no-ops afterwards, except that new calls with
//! result handles are still rejected with `STOPPED`.

use crate::adapters::ConfigError;
use crate::client::ClientTransport;
use crate::domain::{
    CorrelationStatsSnapshot, CorrelationTable, HandlerError, OngoingRequest, ResultHandles,
    RpcCommunicatorConfig, RpcError, MIN_CALL_TIMEOUT,
};
use crate::ports::{IncomingMessageHandler, OutgoingMessageListener};
use crate::registry::{MethodOptions, ServerRegistry};
use async_trait::async_trait;
use parking_lot::RwLock;
use prometheus::Gauge;
use rpc_telemetry::{
    log_rpc_event, metric_inc, time_histogram, RPC_CALL_FAILURES, RPC_HANDLER_DURATION,
    RPC_INCOMING_MESSAGES, RPC_NOTIFICATIONS_SENT, RPC_PENDING_CALLS, RPC_REQUESTS_SENT,
    RPC_RESPONSES_SENT, RPC_SEND_FAILURES, RPC_UNMATCHED_RESPONSES,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::{EventFilter, EventStream, InMemoryEventBus, RpcEvent, Subscription};
use shared_types::{CallContext, MessageKind, RpcMessage};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

struct Inner {
    config: RpcCommunicatorConfig,
    stopped: AtomicBool,
    registry: ServerRegistry,
    table: Arc<CorrelationTable>,
    event_bus: InMemoryEventBus,
    listener: RwLock<Option<Arc<dyn OutgoingMessageListener>>>,
}

/// Transport-agnostic request/response/notification engine.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct RpcCommunicator {
    inner: Arc<Inner>,
}

impl RpcCommunicator {
    /// Create a communicator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(RpcCommunicatorConfig::default())
    }

    /// Create a communicator with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero timeout or a zero event
    /// capacity.
    pub fn with_config(config: RpcCommunicatorConfig) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(Self::build(config))
    }

    fn build(config: RpcCommunicatorConfig) -> Self {
        Self::with_pending_gauge(config, RPC_PENDING_CALLS.clone())
    }

    fn with_pending_gauge(config: RpcCommunicatorConfig, pending_gauge: Gauge) -> Self {
        let registry = ServerRegistry::new(config.method_timeout);
        let event_bus = InMemoryEventBus::with_capacity(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                stopped: AtomicBool::new(false),
                registry,
                table: Arc::new(CorrelationTable::with_pending_gauge(pending_gauge)),
                event_bus,
                listener: RwLock::new(None),
            }),
        }
    }

    /// The configuration this communicator runs with.
    #[must_use]
    pub fn config(&self) -> &RpcCommunicatorConfig {
        &self.inner.config
    }

    /// Install the async send hook. Replaces any previous hook.
    pub fn set_outgoing_message_listener<L>(&self, listener: L)
    where
        L: OutgoingMessageListener + 'static,
    {
        *self.inner.listener.write() = Some(Arc::new(listener));
    }

    /// Register a method that answers with a response.
    pub fn register_rpc_method<Req, Res, F, Fut>(
        &self,
        name: impl Into<String>,
        handler: F,
        options: MethodOptions,
    ) where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, HandlerError>> + Send + 'static,
    {
        self.inner
            .registry
            .register_rpc_method(name, handler, options);
    }

    /// Register a notification handler.
    pub fn register_rpc_notification<Req, F, Fut>(
        &self,
        name: impl Into<String>,
        handler: F,
        options: MethodOptions,
    ) where
        Req: DeserializeOwned + Send + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.inner
            .registry
            .register_rpc_notification(name, handler, options);
    }

    /// The methods this communicator serves.
    #[must_use]
    pub fn registry(&self) -> &ServerRegistry {
        &self.inner.registry
    }

    /// Client for issuing typed calls through this communicator.
    #[must_use]
    pub fn client(&self) -> ClientTransport {
        ClientTransport::new(self.clone())
    }

    /// Subscribe to outgoing-message and lifecycle events.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.inner.event_bus.subscribe(filter)
    }

    /// Stream of outgoing-message and lifecycle events.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.inner.event_bus.event_stream(filter)
    }

    /// Whether `stop` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Number of calls awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.table.len()
    }

    /// Whether a call is awaiting a response under `request_id`.
    #[must_use]
    pub fn is_pending(&self, request_id: &str) -> bool {
        self.inner.table.contains(request_id)
    }

    /// Correlation table statistics.
    #[must_use]
    pub fn stats(&self) -> CorrelationStatsSnapshot {
        self.inner.table.stats().snapshot()
    }

    /// Outbound intake.
    ///
    /// `handles` are the caller's result handles. Responses sent by this
    /// engine pass `None`. Never fails: every failure settles the handles.
    pub async fn handle_outgoing_call(
        &self,
        message: RpcMessage,
        context: Option<CallContext>,
        handles: Option<ResultHandles>,
    ) {
        let request_id = message.request_id.clone();

        if self.is_stopped() {
            if let Some(handles) = handles {
                self.fallback_record(&request_id, handles)
                    .reject_request(RpcError::Stopped);
                metric_inc!(RPC_CALL_FAILURES, &["STOPPED"]);
            }
            return;
        }

        let is_notification =
            message.is_notification() || context.as_ref().is_some_and(|c| c.notification);

        let mut handles = handles;
        let mut registered = false;
        if !is_notification {
            if let Some(call_handles) = handles.take() {
                let timeout = context
                    .as_ref()
                    .and_then(CallContext::timeout)
                    .map_or(self.inner.config.rpc_request_timeout, |t| {
                        t.max(MIN_CALL_TIMEOUT)
                    });
                self.inner
                    .table
                    .register(request_id.clone(), call_handles, timeout);
                registered = true;

                // stop() may have drained the table before the insert.
                if self.is_stopped() {
                    self.inner.table.reject(&request_id, RpcError::Stopped);
                    return;
                }
            }
        }

        trace!(
            request_id = %request_id,
            kind = ?message.kind(),
            method = message.method().unwrap_or_default(),
            "Outgoing message"
        );
        self.record_outgoing(&message);
        self.inner.event_bus.emit(RpcEvent::OutgoingMessage {
            message: message.clone(),
            request_id: request_id.clone(),
            context: context.clone(),
        });

        let listener = self.inner.listener.read().clone();
        if let Some(listener) = listener {
            if let Err(err) = listener.send(&message, &request_id, context.as_ref()).await {
                log_rpc_event!(debug, "Failed to send message", request_id, error = %err);
                metric_inc!(RPC_SEND_FAILURES);

                let error = RpcError::ClientError(err.to_string());
                if registered && self.inner.table.reject(&request_id, error.clone()) {
                    metric_inc!(RPC_CALL_FAILURES, &["CLIENT_ERROR"]);
                } else if let Some(handles) = handles {
                    self.fallback_record(&request_id, handles)
                        .reject_request(error);
                    metric_inc!(RPC_CALL_FAILURES, &["CLIENT_ERROR"]);
                }
                return;
            }
        }

        // Notifications settle once handed to the transport.
        if let Some(handles) = handles {
            self.fallback_record(&request_id, handles)
                .resolve_notification();
        }
    }

    /// Reject a pending call with `CLIENT_ERROR`.
    ///
    /// Returns `false` if no call is pending under `request_id`.
    pub fn handle_client_error(&self, request_id: &str, error: impl Into<String>) -> bool {
        if self.is_stopped() {
            return false;
        }
        let rejected = self
            .inner
            .table
            .reject(request_id, RpcError::ClientError(error.into()));
        if rejected {
            metric_inc!(RPC_CALL_FAILURES, &["CLIENT_ERROR"]);
        }
        rejected
    }

    /// Cancel a pending call. It rejects with [`RpcError::Cancelled`].
    ///
    /// Returns `false` if no call is pending under `request_id`.
    pub fn cancel(&self, request_id: &str) -> bool {
        let cancelled = self.inner.table.reject(request_id, RpcError::Cancelled);
        if cancelled {
            log_rpc_event!(debug, "Cancelled pending call", request_id);
            metric_inc!(RPC_CALL_FAILURES, &["CLIENT_ERROR"]);
        }
        cancelled
    }

    /// Inbound intake.
    pub async fn handle_incoming_message(&self, message: RpcMessage, context: Option<CallContext>) {
        if self.is_stopped() {
            return;
        }

        trace!(request_id = %message.request_id, "Incoming message");
        match message.kind() {
            MessageKind::Response => {
                metric_inc!(RPC_INCOMING_MESSAGES, &["response"]);
                self.on_response(message);
            }
            MessageKind::Request => {
                metric_inc!(RPC_INCOMING_MESSAGES, &["request"]);
                self.on_request(message, context.unwrap_or_default()).await;
            }
            MessageKind::Notification => {
                metric_inc!(RPC_INCOMING_MESSAGES, &["notification"]);
                self.on_notification(message, context.unwrap_or_default())
                    .await;
            }
            MessageKind::Malformed => {
                metric_inc!(RPC_INCOMING_MESSAGES, &["malformed"]);
                trace!(request_id = %message.request_id, "Ignoring unrecognised message");
            }
        }
    }

    /// Stop the communicator. Idempotent.
    ///
    /// Rejects every pending call with `STOPPED`, clears the send hook and
    /// closes the event bus after a final `Stopped` event.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let drained = self.inner.table.drain(&RpcError::Stopped);
        if drained > 0 {
            RPC_CALL_FAILURES
                .with_label_values(&["STOPPED"])
                .inc_by(drained as f64);
        }

        *self.inner.listener.write() = None;
        self.inner.event_bus.emit(RpcEvent::Stopped);
        self.inner.event_bus.close();

        info!(rejected = drained, "RpcCommunicator stopped");
    }

    fn on_response(&self, message: RpcMessage) {
        let request_id = message.request_id.clone();
        let settled = match RpcError::from_response(&message) {
            Some(error) => {
                let kind = error.kind();
                let rejected = self.inner.table.reject(&request_id, error);
                if rejected {
                    metric_inc!(RPC_CALL_FAILURES, &[kind.as_str()]);
                }
                rejected
            }
            None => self.inner.table.resolve(&request_id, message.body),
        };

        if settled {
        } else {
            // Late, duplicate or foreign response.
            metric_inc!(RPC_UNMATCHED_RESPONSES);
            trace!(request_id = %request_id, "Ignoring response without pending call");
        }
    }

    async fn on_request(&self, message: RpcMessage, context: CallContext) {
        let result = {
            let _timer = time_histogram!(RPC_HANDLER_DURATION);
            self.inner
                .registry
                .handle_request(&message, context.clone())
                .await
        };

        let response = match result {
            Ok(body) => RpcMessage::success_response(&message, body),
            Err(err) => {
                log_rpc_event!(
                    debug,
                    "Request handler failed",
                    message.request_id,
                    method = message.method().unwrap_or_default(),
                    error = %err
                );
                err.to_response(&message)
            }
        };

        // Responses never register a pending call.
        self.handle_outgoing_call(response, Some(context), None)
            .await;
    }

    async fn on_notification(&self, message: RpcMessage, context: CallContext) {
        let result = {
            let _timer = time_histogram!(RPC_HANDLER_DURATION);
            self.inner
                .registry
                .handle_notification(&message, context)
                .await
        };

        if let Err(err) = result {
            log_rpc_event!(
                debug,
                "Notification handler failed",
                message.request_id,
                method = message.method().unwrap_or_default(),
                error = %err
            );
        }
    }

    fn fallback_record(&self, request_id: &str, handles: ResultHandles) -> Arc<OngoingRequest> {
        OngoingRequest::detached(request_id, handles, self.inner.config.fallback_timeout)
    }

    fn record_outgoing(&self, message: &RpcMessage) {
        match message.kind() {
            MessageKind::Request => metric_inc!(RPC_REQUESTS_SENT),
            MessageKind::Notification => metric_inc!(RPC_NOTIFICATIONS_SENT),
            MessageKind::Response => {
                let outcome = if message.error_type.is_some() {
                    "error"
                } else {
                    "success"
                };
                metric_inc!(RPC_RESPONSES_SENT, &[outcome]);
            }
            MessageKind::Malformed => {}
        }
    }

}

impl Default for RpcCommunicator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RpcCommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcCommunicator")
            .field("config", &self.inner.config)
            .field("stopped", &self.is_stopped())
            .field("pending", &self.pending_count())
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IncomingMessageHandler for RpcCommunicator {
    async fn handle_incoming_message(&self, message: RpcMessage, context: Option<CallContext>) {
        RpcCommunicator::handle_incoming_message(self, message, context).await;
    }
}
