//! # hg-consensus
//!
//! Consensus engine that delegates transaction ordering to an external
//! hashgraph consensus log.
//!
//! ## Architecture
//!
//! The engine never votes or mines. To seal a block it submits every
//! transaction, in block order, as one message to a configured topic:
//!
//! ```text
//! Block [tx0, tx1, .., txN-1]
//!     │
//!     ├── tx0 ──"0 N 0x<sealHash>"──→ ┐
//!     ├── tx1 ──"1 N 0x<sealHash>"──→ ├── [Consensus Log Topic] ──→ receipts
//!     └── ...                          ┘
//! ```
//!
//! The memo names the block and each message's position, so the order can be
//! rebuilt from the log alone. The seal attached to the header records the
//! sequence number and consensus timestamp of the last message.
//!
//! Submissions are sequential. The first failure aborts the block, and
//! messages already accepted stay on the log.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hg_consensus::{HashgraphConfig, HashgraphEngine, InMemoryConsensusLog};
//!
//! let config = HashgraphConfig::new("0.0.1001", key_hex, "0.0.5005", 100_000_000).resolve()?;
//! let log = InMemoryConsensusLog::new(config.network);
//! log.create_topic(config.topic_id);
//! let client = log.connect(config.network, config.operator_id, &config.operator_key)?;
//! let engine = HashgraphEngine::new(&config, client);
//!
//! engine.seal(&chain, block, results_tx, stop_rx)?;
//! let sealed = results_rx.recv().await;
//! ```

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;
pub mod validation;

pub use adapters::{InMemoryConsensusLog, InMemoryLogClient};
pub use api::HashgraphApi;
pub use config::{ConfigError, HashgraphConfig, OperatorKey, ResolvedConfig};
pub use domain::{
    AccountId, Block, ConsensusError, ConsensusResult, ConsensusTimestamp, HashgraphSeal, Hbar,
    Header, LogError, LogMessage, LogRecord, Network, Receipt, ReceiptStatus, SubmissionRecord,
    TopicId, TransactionId, MAX_MESSAGE_BYTES,
};
pub use ports::{ChainReader, ConsensusEngine, LogClient, RpcApi, SealResult, StateDb};
pub use service::HashgraphEngine;
