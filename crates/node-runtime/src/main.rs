//! # Vivarium Node
//!
//! Runs one peer of the organism migration network.
//!
//! ```text
//! vivarium-node --config vivarium.toml --port 50000
//! RUST_LOG=vv_04_teleport=debug vivarium-node
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::{NodeConfig, NodeRuntime};

/// Vivarium peer node
#[derive(Parser, Debug)]
#[command(name = "vivarium-node", version)]
#[command(about = "Exchange organisms with peer Vivarium instances")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "VIVARIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Peer port, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut config =
        NodeConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.teleport.peer_port = port;
    }

    info!("===========================================");
    info!("  Vivarium Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
