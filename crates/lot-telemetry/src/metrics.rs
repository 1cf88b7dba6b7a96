//! Prometheus metrics for the Lot Integrity Ledger.
//!
//! All metrics follow the naming convention: `lot_ledger_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., readings_registered_total)
//! - **Gauge**: Value that can go up or down (e.g., lots_hosted)
//! - **Histogram**: Distribution of values (e.g., command_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LOT LIFECYCLE
    // =========================================================================

    /// Lots created
    pub static ref LOTS_CREATED: Counter = Counter::new(
        "lot_ledger_lots_created_total",
        "Total number of lots created"
    ).expect("metric creation failed");

    /// Lots reinitialized
    pub static ref LOTS_REINITIALIZED: Counter = Counter::new(
        "lot_ledger_lots_reinitialized_total",
        "Total number of lot reinitializations"
    ).expect("metric creation failed");

    /// Lots currently hosted by the service
    pub static ref LOTS_HOSTED: Gauge = Gauge::new(
        "lot_ledger_lots_hosted",
        "Number of lots hosted by the service"
    ).expect("metric creation failed");

    // =========================================================================
    // COMPLIANCE
    // =========================================================================

    /// Readings appended to temperature logs
    pub static ref READINGS_REGISTERED: CounterVec = CounterVec::new(
        Opts::new("lot_ledger_readings_registered_total", "Temperature readings registered"),
        &["outcome"]  // outcome: compliant/violation
    ).expect("metric creation failed");

    /// Intact -> Compromised transitions
    pub static ref LOTS_COMPROMISED: Counter = Counter::new(
        "lot_ledger_lots_compromised_total",
        "Total number of lots that became compromised"
    ).expect("metric creation failed");

    // =========================================================================
    // CUSTODY AND SENSORS
    // =========================================================================

    /// Custody transfers
    pub static ref CUSTODY_TRANSFERS: Counter = Counter::new(
        "lot_ledger_custody_transfers_total",
        "Total number of custody transfers"
    ).expect("metric creation failed");

    /// Sensor authorization changes
    pub static ref SENSOR_AUTHORIZATIONS: CounterVec = CounterVec::new(
        Opts::new("lot_ledger_sensor_authorizations_total", "Sensor authorization changes"),
        &["enabled"]  // enabled: true/false
    ).expect("metric creation failed");

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Rejected commands by error code
    pub static ref COMMANDS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("lot_ledger_commands_rejected_total", "Commands rejected by the ledger"),
        &["command", "code"]
    ).expect("metric creation failed");

    /// Command duration
    pub static ref COMMAND_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "lot_ledger_command_duration_seconds",
            "Time spent executing ledger commands"
        ).buckets(exponential_buckets(0.00001, 2.0, 15).expect("valid buckets")),
        &["command"]
    ).expect("metric creation failed");

    // =========================================================================
    // DOWNSTREAM
    // =========================================================================

    /// Events published to the bus
    pub static ref EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("lot_ledger_events_published_total", "Events published to the bus"),
        &["event_type"]
    ).expect("metric creation failed");

    /// Failed compromise notifications
    pub static ref NOTIFICATION_FAILURES: Counter = Counter::new(
        "lot_ledger_notification_failures_total",
        "Compromise notifications that could not be delivered"
    ).expect("metric creation failed");
}

/// Handle proving metrics were registered.
#[derive(Debug)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors registered by this call.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Lifecycle
        Box::new(LOTS_CREATED.clone()),
        Box::new(LOTS_REINITIALIZED.clone()),
        Box::new(LOTS_HOSTED.clone()),
        // Compliance
        Box::new(READINGS_REGISTERED.clone()),
        Box::new(LOTS_COMPROMISED.clone()),
        // Custody and sensors
        Box::new(CUSTODY_TRANSFERS.clone()),
        Box::new(SENSOR_AUTHORIZATIONS.clone()),
        // Commands
        Box::new(COMMANDS_REJECTED.clone()),
        Box::new(COMMAND_DURATION.clone()),
        // Downstream
        Box::new(EVENTS_PUBLISHED.clone()),
        Box::new(NOTIFICATION_FAILURES.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
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

    /// Start a timer for one command of [`COMMAND_DURATION`].
    pub fn command(command: &str) -> Self {
        Self::new(&COMMAND_DURATION.with_label_values(&[command]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
