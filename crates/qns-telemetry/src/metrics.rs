//! Prometheus metrics for the name service.
//!
//! All metrics follow the naming convention: `qns_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Crate-level metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Executed registry commands
    pub static ref REGISTRY_OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("qns_registry_operations_total", "Registry operations by outcome"),
        &["operation", "outcome"]  // outcome: ok or the error kind
    ).expect("metric creation failed");

    /// Resolver queries
    pub static ref RESOLUTIONS: CounterVec = CounterVec::new(
        Opts::new("qns_registry_resolutions_total", "Resolver queries by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Command latency
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "qns_registry_operation_duration_seconds",
            "Time spent executing a registry command"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Register every metric with [`REGISTRY`]. Calling it twice is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(REGISTRY_OPERATIONS.clone()),
        Box::new(RESOLUTIONS.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Count one executed command.
pub fn record_operation(operation: &str, outcome: &str) {
    REGISTRY_OPERATIONS
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Count one resolver query.
pub fn record_resolution(outcome: &str) {
    RESOLUTIONS.with_label_values(&[outcome]).inc();
}

/// Encode all metrics in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Observes [`OPERATION_DURATION`] for one operation on drop.
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
}

impl OperationTimer {
    pub fn start(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        OPERATION_DURATION
            .with_label_values(&[self.operation.as_str()])
            .observe(self.start.elapsed().as_secs_f64());
    }
}
