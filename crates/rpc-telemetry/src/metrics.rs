//! Prometheus metrics for the RPC engine.
//!
//! All metrics follow the naming convention: `proto_rpc_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., requests_sent_total)
//! - **Gauge**: Value that can go up or down (e.g., pending_calls)
//! - **Histogram**: Distribution of values (e.g., handler_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Requests handed to the transport
    pub static ref RPC_REQUESTS_SENT: Counter = Counter::new(
        "proto_rpc_requests_sent_total",
        "Total number of request envelopes handed to the transport"
    ).expect("metric creation failed");

    /// Notifications handed to the transport
    pub static ref RPC_NOTIFICATIONS_SENT: Counter = Counter::new(
        "proto_rpc_notifications_sent_total",
        "Total number of notification envelopes handed to the transport"
    ).expect("metric creation failed");

    /// Responses handed to the transport
    pub static ref RPC_RESPONSES_SENT: CounterVec = CounterVec::new(
        Opts::new("proto_rpc_responses_sent_total", "Total response envelopes sent"),
        &["outcome"]  // outcome: success/error
    ).expect("metric creation failed");

    /// Outgoing envelopes the send hook failed to deliver
    pub static ref RPC_SEND_FAILURES: Counter = Counter::new(
        "proto_rpc_send_failures_total",
        "Total number of envelopes the transport failed to send"
    ).expect("metric creation failed");

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Envelopes received, by classification
    pub static ref RPC_INCOMING_MESSAGES: CounterVec = CounterVec::new(
        Opts::new("proto_rpc_incoming_messages_total", "Total envelopes received"),
        &["kind"]  // kind: request/notification/response/malformed
    ).expect("metric creation failed");

    /// Responses with no pending call
    pub static ref RPC_UNMATCHED_RESPONSES: Counter = Counter::new(
        "proto_rpc_unmatched_responses_total",
        "Total responses that matched no pending call"
    ).expect("metric creation failed");

    /// Handler execution time
    pub static ref RPC_HANDLER_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "proto_rpc_handler_duration_seconds",
            "Time spent running registered handlers"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // CALLS
    // =========================================================================

    /// Pending calls awaiting a response
    pub static ref RPC_PENDING_CALLS: Gauge = Gauge::new(
        "proto_rpc_pending_calls",
        "Number of calls awaiting a response"
    ).expect("metric creation failed");

    /// Call failures observed by the engine, by kind
    pub static ref RPC_CALL_FAILURES: CounterVec = CounterVec::new(
        Opts::new("proto_rpc_call_failures_total", "Total call failures"),
        &["kind"]  // kind: SERVER_TIMEOUT/UNKNOWN_RPC_METHOD/CLIENT_ERROR/SERVER_ERROR/STOPPED
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Register all metrics with [`REGISTRY`].
///
/// Idempotent: the first call registers, later calls return its outcome.
pub fn register_metrics() -> Result<(), TelemetryError> {
    REGISTERED
        .get_or_init(|| {
            let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
                // Outbound
                Box::new(RPC_REQUESTS_SENT.clone()),
                Box::new(RPC_NOTIFICATIONS_SENT.clone()),
                Box::new(RPC_RESPONSES_SENT.clone()),
                Box::new(RPC_SEND_FAILURES.clone()),
                // Inbound
                Box::new(RPC_INCOMING_MESSAGES.clone()),
                Box::new(RPC_UNMATCHED_RESPONSES.clone()),
                Box::new(RPC_HANDLER_DURATION.clone()),
                // Calls
                Box::new(RPC_PENDING_CALLS.clone()),
                Box::new(RPC_CALL_FAILURES.clone()),
            ];

            for metric in metrics {
                REGISTRY.register(metric).map_err(|e| e.to_string())?;
            }
            Ok(())
        })
        .clone()
        .map_err(TelemetryError::MetricsInit)
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
