//! Structured logging.
//!
//! Logs carry consistent fields so that they can be parsed downstream:
//! - `service`: Service name from [`TelemetryConfig`]
//! - `request_id`: Correlation id of the call (per-call events)
//! - `method`: Target method name, where known
//! - Additional context fields

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// JSON output is meant for containers, the pretty format for development.
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        return Ok(());
    }

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test: only the first call installs anything.
/// Honors `RUST_LOG`, defaulting to `debug`.
pub fn init_test_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Log a call-related event with standard fields.
///
/// ```rust,ignore
/// log_rpc_event!(debug, "Rejecting pending call", request_id, kind = %error.kind());
/// ```
#[macro_export]
macro_rules! log_rpc_event {
    ($level:ident, $msg:expr, $request_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = "proto-rpc",
            request_id = %$request_id,
            $($($field)*,)?
            $msg
        )
    };
}
