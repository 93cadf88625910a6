//! # QNS Node
//!
//! Development node for the Quantum Name Service.
//!
//! Reads one JSON command per line from stdin, executes it against the
//! registry and writes one JSON response per line to stdout. Logs go to
//! stderr. Commands run strictly one after another.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags and load `TelemetryConfig` / `RegistryConfig` from env
//! 2. Initialize logging and metrics
//! 3. Open the store (file-backed with `--data-file`, in-memory otherwise)
//! 4. Serve stdin until EOF or Ctrl+C

mod commands;
mod router;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use qns_registry::prelude::*;
use qns_telemetry::{init_telemetry, TelemetryConfig};

use crate::router::{CommandRouter, NodeSink};

/// QNS Node: decentralized name registry over JSON lines
#[derive(Parser, Debug)]
#[command(name = "qns-node")]
#[command(about = "Run the Quantum Name Service registry over stdin/stdout")]
struct Args {
    /// Persist registry state to this file (in-memory if omitted)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Log level or EnvFilter directive (overrides QNS_LOG_LEVEL)
    #[arg(short, long)]
    log_level: Option<String>,

    /// CNAME redirect budget for `resolve`
    #[arg(long)]
    max_redirects: Option<i32>,

    /// Total fee budget; unlimited if omitted
    #[arg(long)]
    fee_budget: Option<u64>,
}

impl Args {
    fn telemetry_config(&self) -> TelemetryConfig {
        let mut config = TelemetryConfig::from_env();
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level.clone());
        }
        if self.json_logs {
            config = config.with_json_logs(true);
        }
        config
    }

    fn registry_config(&self) -> RegistryConfig {
        let config = RegistryConfig::from_env();
        match self.max_redirects {
            Some(max_redirects) => config.with_max_redirects(max_redirects),
            None => config,
        }
    }

    fn fee_meter(&self) -> MeteredFeeMeter {
        match self.fee_budget {
            Some(budget) => MeteredFeeMeter::with_budget(budget),
            None => MeteredFeeMeter::unlimited(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry =
        init_telemetry(&args.telemetry_config()).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  QNS Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = args.registry_config();
    let fee_meter = args.fee_meter();
    match &args.data_file {
        Some(path) => {
            let store = FileBackedKVStore::open(path)
                .with_context(|| format!("Failed to open data file {}", path.display()))?;
            info!(path = %path.display(), "Using file-backed store");
            serve(store, fee_meter, config).await
        }
        None => {
            info!("Using in-memory store; state is lost on exit");
            serve(InMemoryKVStore::new(), fee_meter, config).await
        }
    }
}

/// Build the service and run the command loop.
async fn serve<KV: KeyValueStore>(
    kv_store: KV,
    fee_meter: MeteredFeeMeter,
    config: RegistryConfig,
) -> Result<()> {
    let sink = NodeSink::default();
    let events = sink.recorder.clone();
    let deps = NameServiceDependencies {
        kv_store,
        fee_meter,
        clock: SystemClock,
        sink,
        hook: NoopTransferHook,
    };
    let service = NameService::new(deps, config).context("Failed to start name service")?;
    let mut router = CommandRouter::new(service, events);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Node is ready. Send one JSON command per line.");
    let mut handled: u64 = 0;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };
        let Some(line) = line else {
            info!("stdin closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = router.handle_line(&line);
        let mut encoded = serde_json::to_string(&response).context("Failed to encode response")?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
        handled += 1;
    }

    info!(commands = handled, "Shutdown complete");
    Ok(())
}
