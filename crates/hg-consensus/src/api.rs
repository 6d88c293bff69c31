//! `hashgraph` RPC namespace
//!
//! Read-only views over the engine's topic, operator and sealed blocks.

use crate::domain::{AccountId, ConsensusResult, Header, LogRecord, Receipt, TopicId};
use crate::ports::{ChainReader, ConsensusEngine, LogClient};
use crate::service::HashgraphEngine;
use shared_types::{Address, Hash};

pub const NAMESPACE: &str = "hashgraph";
pub const VERSION: &str = "1.0";

/// Service behind the `hashgraph` namespace.
pub struct HashgraphApi<L> {
    engine: HashgraphEngine<L>,
}

impl<L> Clone for HashgraphApi<L> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<L: LogClient + 'static> HashgraphApi<L> {
    pub fn new(engine: HashgraphEngine<L>) -> Self {
        Self { engine }
    }

    pub fn topic_id(&self) -> TopicId {
        self.engine.topic_id()
    }

    pub fn operator(&self) -> AccountId {
        self.engine.operator()
    }

    /// The operator's EVM-form address, the coinbase of every prepared block.
    pub fn operator_address(&self) -> Address {
        self.engine.operator().to_evm_address()
    }

    /// Receipts of a block sealed by this node, if still indexed.
    pub fn block_receipts(&self, block_hash: &Hash) -> Option<Vec<Receipt>> {
        self.engine.block_receipts(block_hash)
    }

    /// Log messages that reference the header's seal hash.
    pub async fn block_records(&self, header: &Header) -> ConsensusResult<Vec<LogRecord>> {
        self.engine.block_records(&header.seal_hash()).await
    }

    /// Check a header's seal against the consensus log.
    pub async fn verify_block(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
    ) -> ConsensusResult<()> {
        self.engine.verify_seal(chain, header).await
    }
}
