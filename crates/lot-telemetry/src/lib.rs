//! # Lot Telemetry
//!
//! Observability for the Lot Integrity Ledger.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with pretty or JSON output
//! - **Metrics**: Prometheus counters and histograms in a local registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lot_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `lot-ledger` | Service name in logs |
//! | `LOT_LOG_LEVEL` | `info` | Log level filter |
//! | `LOT_JSON_LOGS` | `false` | JSON log output |
//! | `LOT_CONSOLE_OUTPUT` | `true` | Console output |
//! | `LOT_NETWORK` | `poc` | Deployment name |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, HistogramTimer, MetricsHandle, COMMANDS_REJECTED,
    COMMAND_DURATION, CUSTODY_TRANSFERS, EVENTS_PUBLISHED, LOTS_COMPROMISED, LOTS_CREATED,
    LOTS_HOSTED, LOTS_REINITIALIZED, NOTIFICATION_FAILURES, READINGS_REGISTERED,
    SENSOR_AUTHORIZATIONS,
};
pub use tracing_setup::{build_filter, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Unusable configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first
    let metrics = register_metrics()?;

    let tracing = tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing,
        _metrics: metrics,
    })
}

/// Install a quiet subscriber for tests. Ignores an already-installed one.
pub fn init_test_telemetry() {
    let _ = register_metrics();
    let _ = tracing_setup::init_tracing(&TelemetryConfig::for_tests());
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Span for one command on one lot.
///
/// # Example
///
/// ```rust,ignore
/// use lot_telemetry::lot_span;
///
/// async fn transfer(lot_id: &str) {
///     async { /* command */ }
///         .instrument(lot_span!("transfer_custody", lot_id))
///         .await
/// }
/// ```
#[macro_export]
macro_rules! lot_span {
    ($name:expr, $lot_id:expr) => {
        tracing::info_span!($name, lot_id = %$lot_id)
    };
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
