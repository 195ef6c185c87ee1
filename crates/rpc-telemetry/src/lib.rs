//! # RPC Telemetry
//!
//! Logging and metrics for the RPC engine.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter` and a pretty or JSON
//!   formatter
//! - **Metrics**: Prometheus counters, gauges and histograms behind a global
//!   registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rpc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!
//!     // Your application code here
//!     println!("{}", rpc_telemetry::encode_metrics().unwrap());
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RPC_SERVICE_NAME` | `proto-rpc` | Service name in logs |
//! | `RPC_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `RPC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `RPC_JSON_LOGS` | `false` | JSON log lines (default on in containers) |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, RPC_CALL_FAILURES, RPC_HANDLER_DURATION,
    RPC_INCOMING_MESSAGES, RPC_NOTIFICATIONS_SENT, RPC_PENDING_CALLS, RPC_REQUESTS_SENT,
    RPC_RESPONSES_SENT, RPC_SEND_FAILURES, RPC_UNMATCHED_RESPONSES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and logging.
///
/// Metrics are registered first, so a logging failure still leaves them
/// usable.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
