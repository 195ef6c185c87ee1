//! Call lifecycle record.
//!
//! One `OngoingRequest` owns one call's result handles and its timeout timer.
//! It moves from pending to resolved or rejected exactly once: every settle
//! path takes the handles out of their slot, so later attempts are no-ops.

use crate::domain::correlation_table::CorrelationTable;
use crate::domain::errors::RpcError;
use crate::domain::handles::ResultHandles;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A single in-flight call.
#[derive(Debug)]
pub struct OngoingRequest {
    request_id: String,
    handles: Mutex<Option<ResultHandles>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    table: Weak<CorrelationTable>,
    timeout: Duration,
    created_at: Instant,
}

impl OngoingRequest {
    /// Start a record that is not stored in any table.
    ///
    /// Used to settle calls that never get registered (stopped engine,
    /// notifications, send failures). Must be called within a tokio runtime.
    pub fn detached(
        request_id: impl Into<String>,
        handles: ResultHandles,
        timeout: Duration,
    ) -> Arc<Self> {
        let record = Self::new(request_id.into(), handles, timeout, Weak::new());
        record.arm();
        record
    }

    /// Build a pending record without a timer. Call [`arm`](Self::arm) once
    /// the record is reachable from `table`.
    pub(crate) fn new(
        request_id: String,
        handles: ResultHandles,
        timeout: Duration,
        table: Weak<CorrelationTable>,
    ) -> Arc<Self> {
        Arc::new(Self {
            request_id,
            handles: Mutex::new(Some(handles)),
            timer: Mutex::new(None),
            table,
            timeout,
            created_at: Instant::now(),
        })
    }

    /// Arm the timeout timer. On expiry the record rejects with
    /// `ClientTimeout` and removes itself from its table.
    ///
    /// No-op if the record is already settled or armed.
    pub(crate) fn arm(self: &Arc<Self>) {
        // Held across the spawn so a concurrent settle aborts the new timer.
        let mut slot = self.timer.lock();
        if slot.is_some() || self.is_settled() {
            return;
        }

        // The armed timer keeps the record alive until it fires or is aborted.
        let armed = Arc::clone(self);
        let timeout = self.timeout;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            armed.on_timeout();
        }));
    }

    /// Correlation id of the call.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Timeout the record was armed with.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time since the record was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Whether the record has already been settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.handles.lock().is_none()
    }

    /// Settle with a response body. A missing body is parsed as empty.
    ///
    /// Returns `false` if the record was already settled.
    pub fn resolve_request(&self, body: Option<Vec<u8>>) -> bool {
        let Some(handles) = self.take_handles() else {
            return false;
        };
        trace!(
            request_id = %self.request_id,
            elapsed_ms = self.elapsed().as_millis(),
            "Resolving request"
        );
        handles.resolve(body.unwrap_or_default());
        true
    }

    /// Settle a notification: it was handed to the transport.
    ///
    /// Returns `false` if the record was already settled.
    pub fn resolve_notification(&self) -> bool {
        let Some(handles) = self.take_handles() else {
            return false;
        };
        trace!(request_id = %self.request_id, "Resolving notification");
        handles.resolve(Vec::new());
        true
    }

    /// Settle with a failure.
    ///
    /// Returns `false` if the record was already settled.
    pub fn reject_request(&self, error: RpcError) -> bool {
        let Some(handles) = self.take_handles() else {
            return false;
        };
        debug!(
            request_id = %self.request_id,
            kind = %error.kind(),
            error = %error,
            "Rejecting request"
        );
        handles.reject(error);
        true
    }

    fn take_handles(&self) -> Option<ResultHandles> {
        let handles = self.handles.lock().take()?;
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
        Some(handles)
    }

    fn on_timeout(self: Arc<Self>) {
        // Already running: drop the handle instead of aborting ourselves.
        self.timer.lock().take();

        let Some(handles) = self.handles.lock().take() else {
            return;
        };

        if let Some(table) = self.table.upgrade() {
            table.expire(&self);
        }

        debug!(
            request_id = %self.request_id,
            timeout_ms = self.timeout.as_millis(),
            "Rpc request timed out"
        );
        handles.reject(RpcError::ClientTimeout);
    }
}
