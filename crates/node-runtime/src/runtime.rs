//! # Node Runtime
//!
//! Wires a [`HashgraphEngine`] to an in-memory consensus log and a dev chain,
//! then produces one block per interval until shutdown.
//!
//! ## Block Flow
//!
//! ```text
//! prepare ──→ finalize_and_assemble ──→ seal ──→ verify_header(seal) ──→ chain
//!                                         │
//!                                         └── one log message per transaction
//! ```

use crate::config::NodeConfig;
use crate::dev_chain::{DevChain, DevState};
use anyhow::{Context, Result};
use hg_consensus::{
    Block, ChainReader, ConsensusEngine, HashgraphEngine, Header, InMemoryConsensusLog,
    InMemoryLogClient,
};
use shared_types::{hash_to_hex, Address, Transaction, U256, ZERO_ADDRESS, ZERO_HASH};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tokio::time::Interval;
use tracing::{info, warn};

/// The dev node.
pub struct NodeRuntime {
    engine: HashgraphEngine<InMemoryLogClient>,
    log: InMemoryConsensusLog,
    chain: Arc<DevChain>,
    block_interval: Option<Duration>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Validate `config`, open the dev log and build the engine.
    ///
    /// The configured topic is created on the dev log, so any topic id works.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let resolved = config
            .hashgraph
            .resolve()
            .context("invalid hashgraph configuration")?;

        let log = InMemoryConsensusLog::new(resolved.network);
        log.create_topic(resolved.topic_id);
        let client = log
            .connect(resolved.network, resolved.operator_id, &resolved.operator_key)
            .context("failed to open consensus log session")?;
        let engine = HashgraphEngine::new(&resolved, client);

        let chain = Arc::new(DevChain::with_genesis(unix_now()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            engine,
            log,
            chain,
            block_interval: config.block_interval,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn engine(&self) -> &HashgraphEngine<InMemoryLogClient> {
        &self.engine
    }

    pub fn log(&self) -> &InMemoryConsensusLog {
        &self.log
    }

    pub fn chain(&self) -> Arc<DevChain> {
        Arc::clone(&self.chain)
    }

    /// Log the exposed RPC namespaces.
    pub fn start(&self) {
        info!("===========================================");
        info!("  Hashgraph Dev Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        for api in self.engine.apis(self.chain.as_ref()) {
            info!(
                namespace = api.namespace,
                version = api.version,
                public = api.public,
                topic = %api.service.topic_id(),
                operator = %api.service.operator(),
                "RPC API registered"
            );
        }
        match self.block_interval {
            Some(interval) => info!(?interval, "block production enabled"),
            None => info!("block production disabled"),
        }
    }

    /// Produce blocks until [`NodeRuntime::request_shutdown`] is called.
    pub async fn run(&self) -> Result<()> {
        let mut shutdown = self.shutdown_rx.clone();
        let mut ticker = self.block_interval.map(tokio::time::interval);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = next_tick(&mut ticker) => {
                    match self.produce_block().await {
                        Ok(block) => info!(
                            number = block.header.number,
                            hash = %hash_to_hex(&block.hash()),
                            txs = block.transactions.len(),
                            "block imported"
                        ),
                        Err(e) => warn!(error = %e, "block production failed"),
                    }
                }
            }
        }
        Ok(())
    }

    /// Build, seal, verify and import one block on top of the current head.
    pub async fn produce_block(&self) -> Result<Block> {
        let chain = self.chain.as_ref();
        let parent = chain.current_header().context("chain has no head")?;

        let mut header = Header {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp: unix_now().max(parent.timestamp),
            coinbase: ZERO_ADDRESS,
            state_root: ZERO_HASH,
            transactions_root: ZERO_HASH,
            tx_count: 0,
            difficulty: U256::zero(),
            extra: Vec::new(),
            seal: None,
        };
        self.engine.prepare(chain, &mut header)?;

        let transactions = vec![heartbeat(header.number, header.coinbase)];
        let mut state = DevState::at(header.number);
        let block =
            self.engine
                .finalize_and_assemble(chain, header, &mut state, transactions, Vec::new())?;

        let (results, mut sealed_rx) = mpsc::channel(1);
        self.engine
            .seal(chain, block, results, self.shutdown_rx.clone())?;
        let sealed = sealed_rx
            .recv()
            .await
            .context("seal task ended without a result")??;

        self.engine.verify_header(chain, &sealed.header, true).await?;
        self.chain.insert(sealed.header.clone());
        Ok(sealed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Stop producing blocks and release the log session.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.request_shutdown();
        self.engine.close().await?;
        info!(height = self.chain.height(), "Shutdown complete");
        Ok(())
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Self-transfer carried by every dev block so each seal reaches the log.
fn heartbeat(number: u64, operator: Address) -> Transaction {
    Transaction {
        nonce: number,
        from: operator,
        to: Some(operator),
        value: U256::zero(),
        gas_price: U256::zero(),
        gas_limit: 21_000,
        data: b"heartbeat".to_vec(),
        signature: Vec::new(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg_consensus::ConsensusError;

    fn dev_config(block_interval: Option<Duration>) -> NodeConfig {
        NodeConfig {
            hashgraph: hg_consensus::HashgraphConfig::new(
                "0.0.1001",
                "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
                "0.0.5005",
                100_000_000,
            ),
            block_interval,
            log_level: "info".into(),
        }
    }

    #[tokio::test]
    async fn test_produce_blocks_extends_chain_and_log() {
        let runtime = NodeRuntime::new(dev_config(None)).unwrap();
        let topic = runtime.engine().topic_id();

        let first = runtime.produce_block().await.unwrap();
        let second = runtime.produce_block().await.unwrap();

        assert_eq!(runtime.chain().height(), 2);
        assert_eq!(second.header.parent_hash, first.hash());
        assert_eq!(runtime.log().message_count(&topic), 2);
        assert!(runtime.engine().block_receipts(&second.hash()).is_some());
    }

    #[tokio::test]
    async fn test_shutdown_closes_engine() {
        let runtime = NodeRuntime::new(dev_config(None)).unwrap();
        runtime.shutdown().await.unwrap();
        runtime.shutdown().await.unwrap();

        assert!(runtime.engine().is_closed());
        let err = runtime.produce_block().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConsensusError>(),
            Some(ConsensusError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_run_returns_after_shutdown_request() {
        let config = dev_config(Some(Duration::from_millis(10)));
        let runtime = Arc::new(NodeRuntime::new(config).unwrap());
        let worker = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move { runtime.run().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        runtime.request_shutdown();
        worker.await.unwrap().unwrap();
        assert!(runtime.chain().height() >= 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = dev_config(None);
        config.hashgraph.topic_id = "not-a-topic".into();
        assert!(NodeRuntime::new(config).is_err());
    }
}
