//! Telemetry configuration from environment variables.

use std::env;

use crate::TelemetryError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name for startup and shutdown logs
    pub service_name: String,

    /// Log level filter, either a bare level or an `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stderr
    pub console_output: bool,

    /// Whether to emit JSON log lines
    pub json_logs: bool,

    /// Network label (devnet, testnet, mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "qns-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "devnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: qns-node)
    /// - `QNS_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `QNS_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `QNS_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `QNS_NETWORK`: Network name (default: devnet)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("QNS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env::var("QNS_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(defaults.console_output),

            json_logs: env::var("QNS_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(defaults.json_logs),

            network: env::var("QNS_NETWORK").unwrap_or(defaults.network),
        }
    }

    /// Override the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Switch JSON output on or off.
    #[must_use]
    pub fn with_json_logs(mut self, json_logs: bool) -> Self {
        self.json_logs = json_logs;
        self
    }

    /// Reject an empty service name or an unknown bare level.
    ///
    /// Directives such as `qns_registry=debug` are passed to `EnvFilter` as is.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::Config("service name is empty".to_string()));
        }
        let level = self.log_level.trim();
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(TelemetryError::Config(format!(
                "unknown log level {level:?}"
            )));
        }
        Ok(())
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
