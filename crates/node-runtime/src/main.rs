//! # Hashgraph Dev Node
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `HG_*` environment variables
//! 2. Initialize logging (`RUST_LOG`, else `HG_LOG_LEVEL`)
//! 3. Resolve credentials and open the consensus log session
//! 4. Produce blocks until Ctrl+C
//! 5. Close the engine

use std::sync::Arc;

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env()?;
    init_tracing(&config.log_level)?;
    info!(config = ?config.hashgraph, "configuration loaded");

    let runtime = Arc::new(NodeRuntime::new(config)?);
    runtime.start();

    let worker = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.run().await })
    };

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.request_shutdown();
    worker.await??;
    runtime.shutdown().await?;

    Ok(())
}
