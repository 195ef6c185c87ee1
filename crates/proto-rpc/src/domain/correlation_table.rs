//! Correlation Table - correlation id to pending call.
//!
//! A record is in the table iff it is pending. Every settle path goes through
//! a removal first, so settlement always removes the entry. Lock scope is the
//! map shard only; settlement runs after the entry has left the map.

use crate::domain::errors::{RpcError, RpcErrorKind};
use crate::domain::handles::ResultHandles;
use crate::domain::ongoing_request::OngoingRequest;
use dashmap::DashMap;
use prometheus::Gauge;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Statistics for the correlation table.
#[derive(Debug, Default)]
pub struct CorrelationStats {
    /// Total calls registered
    pub total_registered: AtomicU64,
    /// Total calls settled by a response
    pub total_completed: AtomicU64,
    /// Total calls whose timer fired
    pub total_timeouts: AtomicU64,
    /// Total calls cancelled, failed locally or drained on stop
    pub total_cancelled: AtomicU64,
}

/// Plain copy of [`CorrelationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationStatsSnapshot {
    pub total_registered: u64,
    pub total_completed: u64,
    pub total_timeouts: u64,
    pub total_cancelled: u64,
}

impl CorrelationStats {
    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> CorrelationStatsSnapshot {
        CorrelationStatsSnapshot {
            total_registered: self.total_registered.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_timeouts: self.total_timeouts.load(Ordering::Relaxed),
            total_cancelled: self.total_cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Map of correlation id to pending call.
///
/// An attached gauge is moved by each insert and removal, never set, so any
/// number of tables can share one process-wide gauge.
#[derive(Default)]
pub struct CorrelationTable {
    records: DashMap<String, Arc<OngoingRequest>>,
    stats: CorrelationStats,
    pending_gauge: Option<Gauge>,
}

impl CorrelationTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table that tracks its size in `gauge`.
    #[must_use]
    pub fn with_pending_gauge(gauge: Gauge) -> Self {
        Self {
            pending_gauge: Some(gauge),
            ..Self::default()
        }
    }

    /// Register a pending call and arm its timer.
    ///
    /// Duplicate ids are not detected: the newer record replaces the older
    /// one in the table, and the older one settles through its own timer.
    pub fn register(
        self: &Arc<Self>,
        request_id: impl Into<String>,
        handles: ResultHandles,
        timeout: Duration,
    ) -> Arc<OngoingRequest> {
        let request_id = request_id.into();
        let record =
            OngoingRequest::new(request_id.clone(), handles, timeout, Arc::downgrade(self));

        // Insert before arming, so an immediate expiry finds its entry.
        if self.records.insert(request_id, Arc::clone(&record)).is_none() {
            self.inc_pending();
        }
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        record.arm();

        trace!(
            request_id = %record.request_id(),
            timeout_ms = timeout.as_millis(),
            "Registered pending call"
        );

        record
    }

    /// Remove and return the record for `request_id`.
    pub fn take(&self, request_id: &str) -> Option<Arc<OngoingRequest>> {
        let (_, record) = self.records.remove(request_id)?;
        self.dec_pending();
        Some(record)
    }

    /// Settle the pending call with a response body.
    ///
    /// Returns `false` if no call is pending under `request_id`.
    pub fn resolve(&self, request_id: &str, body: Option<Vec<u8>>) -> bool {
        let Some(record) = self.take(request_id) else {
            return false;
        };
        let settled = record.resolve_request(body);
        if settled {
            self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
        }
        settled
    }

    /// Settle the pending call with a failure.
    ///
    /// Returns `false` if no call is pending under `request_id`.
    pub fn reject(&self, request_id: &str, error: RpcError) -> bool {
        let Some(record) = self.take(request_id) else {
            return false;
        };
        let local = matches!(error.kind(), RpcErrorKind::ClientError | RpcErrorKind::Stopped);
        let settled = record.reject_request(error);
        if settled {
            let counter = if local {
                &self.stats.total_cancelled
            } else {
                &self.stats.total_completed
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        settled
    }

    /// Reject every pending call with `error` and clear the table.
    ///
    /// Returns the number of calls rejected.
    pub fn drain(&self, error: &RpcError) -> usize {
        let ids: Vec<String> = self.records.iter().map(|e| e.key().clone()).collect();
        ids.iter()
            .filter(|id| self.reject(id, error.clone()))
            .count()
    }

    /// Called by a record whose timer fired. Removes it only if the table
    /// still maps its id to this exact record.
    pub(crate) fn expire(&self, record: &Arc<OngoingRequest>) {
        let removed = self
            .records
            .remove_if(record.request_id(), |_, current| Arc::ptr_eq(current, record))
            .is_some();
        if removed {
            self.dec_pending();
            self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Whether a call is pending under `request_id`.
    #[must_use]
    pub fn contains(&self, request_id: &str) -> bool {
        self.records.contains_key(request_id)
    }

    /// Number of pending calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no calls are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Table statistics.
    #[must_use]
    pub fn stats(&self) -> &CorrelationStats {
        &self.stats
    }

    fn inc_pending(&self) {
        if let Some(gauge) = &self.pending_gauge {
            gauge.inc();
        }
    }

    fn dec_pending(&self) {
        if let Some(gauge) = &self.pending_gauge {
            gauge.dec();
        }
    }
}

impl std::fmt::Debug for CorrelationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationTable")
            .field("pending", &self.records.len())
            .field("stats", &self.stats.snapshot())
            .field("tracks_gauge", &self.pending_gauge.is_some())
            .finish()
    }
}
