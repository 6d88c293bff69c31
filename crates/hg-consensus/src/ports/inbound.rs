//! Driving ports (Inbound API)
//!
//! The fixed contract the host client expects from any consensus engine.

use super::{ChainReader, StateDb};
use crate::domain::{Block, ConsensusResult, Header};
use async_trait::async_trait;
use shared_types::{Address, Hash, Transaction, U256};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Outcome of a seal request, delivered on the results channel.
pub type SealResult = ConsensusResult<Block>;

/// An API namespace the engine exposes over the host's RPC layer.
#[derive(Clone, Debug)]
pub struct RpcApi<S> {
    pub namespace: &'static str,
    pub version: &'static str,
    pub service: S,
    pub public: bool,
}

/// Consensus engine contract
#[async_trait]
pub trait ConsensusEngine: Send + Sync {
    /// Service type behind [`ConsensusEngine::apis`].
    type Api: Send + Sync;

    /// Address of the account that sealed the block.
    fn author(&self, header: &Header) -> ConsensusResult<Address>;

    /// Check a header against the consensus rules.
    ///
    /// When `seal` is true the seal is verified as well.
    async fn verify_header(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        seal: bool,
    ) -> ConsensusResult<()>;

    /// Verify a batch of headers in the background.
    ///
    /// Results arrive in input order. Sending `true` on the returned handle
    /// stops verification; remaining headers produce no result.
    fn verify_headers(
        &self,
        chain: Arc<dyn ChainReader>,
        headers: Vec<Header>,
        seals: Vec<bool>,
    ) -> (watch::Sender<bool>, mpsc::Receiver<ConsensusResult<()>>);

    /// Check that the block's uncles conform to the consensus rules.
    fn verify_uncles(&self, chain: &dyn ChainReader, block: &Block) -> ConsensusResult<()>;

    /// Check the consensus-log seal of a header.
    async fn verify_seal(&self, chain: &dyn ChainReader, header: &Header) -> ConsensusResult<()>;

    /// Initialise the consensus fields of a header before execution.
    fn prepare(&self, chain: &dyn ChainReader, header: &mut Header) -> ConsensusResult<()>;

    /// Apply post-transaction state changes without assembling the block.
    fn finalize(
        &self,
        chain: &dyn ChainReader,
        header: &mut Header,
        state: &mut dyn StateDb,
        transactions: &[Transaction],
        uncles: &[Header],
    );

    /// Apply post-transaction state changes and assemble the final block.
    fn finalize_and_assemble(
        &self,
        chain: &dyn ChainReader,
        header: Header,
        state: &mut dyn StateDb,
        transactions: Vec<Transaction>,
        uncles: Vec<Header>,
    ) -> ConsensusResult<Block>;

    /// Start sealing `block`. Returns immediately.
    ///
    /// The sealed block, or the error that stopped sealing, is pushed onto
    /// `results`. Sending `true` on `stop` aborts between submissions.
    fn seal(
        &self,
        chain: &dyn ChainReader,
        block: Block,
        results: mpsc::Sender<SealResult>,
        stop: watch::Receiver<bool>,
    ) -> ConsensusResult<()>;

    /// Hash of the header before its seal is attached.
    fn seal_hash(&self, header: &Header) -> Hash;

    /// Difficulty a block at `time` should have on top of `parent`.
    fn calc_difficulty(&self, chain: &dyn ChainReader, time: u64, parent: &Header) -> U256;

    /// RPC APIs provided by this engine.
    fn apis(&self, chain: &dyn ChainReader) -> Vec<RpcApi<Self::Api>>;

    /// Release the engine's resources. Later calls are no-ops.
    async fn close(&self) -> ConsensusResult<()>;
}
