//! Beacon Relay replay tool
//!
//! Usage:
//!     beacon-relay --input beacons.ndjson
//!     capture-beacons | beacon-relay

use anyhow::{Context, Result};
use beacon_logging::{init_logging, LogConfig};
use beacon_protocol::RelayConfig;
use beacon_relay::{replay_lines, BeaconForwarder, HostBus, PixelTransportFactory, PluginRegistry};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, BufReader};

/// Time left for in-flight pixel requests before the runtime shuts down.
const SETTLE_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "beacon-relay", about = "Repeat captured beacons to the secondary collector")]
struct Args {
    /// Newline-delimited JSON beacons (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short)]
    verbose: bool,
}

// Single-threaded so the relay loop only runs once the firing handler has returned
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LogConfig {
        app_name: "beacon-relay",
        verbose: args.verbose,
    })?;

    let config = RelayConfig::default();
    config.validate().context("Invalid relay configuration")?;
    tracing::info!("Repeating beacons to {}", config.target);

    let bus = Arc::new(HostBus::new());
    let registry = PluginRegistry::new();
    let (forwarder, relay_loop) = BeaconForwarder::install(
        &registry,
        bus.clone(),
        config,
        Arc::new(PixelTransportFactory::new()),
    )?;
    forwarder.initialize();

    let relay_task = relay_loop.map(|relay_loop| tokio::spawn(relay_loop.run()));

    let reader: Box<dyn AsyncBufRead + Unpin> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let summary = replay_lines(reader, &bus)
        .await
        .context("Failed to read beacons")?;

    // Dropping every sender lets the relay loop finish
    drop(forwarder);
    drop(registry);
    drop(bus);

    if let Some(task) = relay_task {
        let stats = task.await.context("Relay loop panicked")?;
        if stats.forwarded > 0 {
            tokio::time::sleep(SETTLE_GRACE).await;
        }
        tracing::info!(
            "Replayed {} beacons ({} skipped): {} repeated, {} dropped",
            summary.fired,
            summary.skipped,
            stats.forwarded,
            stats.dropped
        );
    }

    Ok(())
}
