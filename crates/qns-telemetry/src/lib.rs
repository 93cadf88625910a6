//! # QNS Telemetry
//!
//! Structured logging and Prometheus metrics for the name service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qns_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! qns_telemetry::record_operation("register", "ok");
//! println!("{}", qns_telemetry::gather_metrics()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `qns-node` | Service name attached to startup logs |
//! | `QNS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QNS_JSON_LOGS` | `false` | JSON log lines instead of pretty output |
//! | `QNS_CONSOLE_OUTPUT` | `true` | Write logs to stderr at all |
//! | `QNS_NETWORK` | `devnet` | Network label |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, record_operation, record_resolution, register_metrics, OperationTimer,
    OPERATION_DURATION, REGISTRY, REGISTRY_OPERATIONS, RESOLUTIONS,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the process; dropping it logs
/// the shutdown.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_tracing(config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
