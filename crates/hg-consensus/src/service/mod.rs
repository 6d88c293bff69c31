//! Hashgraph consensus engine
//!
//! Implements [`ConsensusEngine`] on top of a [`LogClient`]. Block order is
//! fixed by submitting each transaction to the consensus log; the seal records
//! where the last message landed so any node can check it against the log.

pub mod sealing;


use crate::api::{HashgraphApi, NAMESPACE, VERSION};
use crate::config::ResolvedConfig;
use crate::domain::{
    AccountId, Block, ConsensusError, ConsensusResult, HashgraphSeal, Header, LogRecord, Receipt,
    TopicId,
};
use crate::metrics;
use crate::ports::{
    ChainReader, ConsensusEngine, LogClient, RpcApi, SealResult, StateDb, SystemTimeSource,
    TimeSource,
};
use crate::state::EngineState;
use crate::validation::HeaderValidator;
use async_trait::async_trait;
use sealing::Sealer;
use shared_types::{hash_to_hex, Address, Hash, Transaction, U256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

/// Consensus engine backed by a hashgraph consensus log.
///
/// Cloning is cheap and shares the log session.
pub struct HashgraphEngine<L> {
    inner: Arc<EngineInner<L>>,
}

impl<L> Clone for HashgraphEngine<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<L> {
    operator: AccountId,
    topic_id: TopicId,
    max_future_drift_secs: u64,
    log: Arc<L>,
    sealer: Sealer<L>,
    seal_lock: Mutex<()>,
    state: EngineState,
    time_source: Box<dyn TimeSource>,
}

impl<L: LogClient + 'static> HashgraphEngine<L> {
    /// Build an engine around an open log session for `config`'s operator.
    pub fn new(config: &ResolvedConfig, log: L) -> Self {
        Self::with_time_source(config, log, Box::new(SystemTimeSource))
    }

    pub fn with_time_source(
        config: &ResolvedConfig,
        log: L,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        let log = Arc::new(log);
        let sealer = Sealer::new(
            Arc::clone(&log),
            config.topic_id,
            config.max_fee,
            config.submit_timeout,
        );

        info!(
            operator = %config.operator_id,
            topic = %config.topic_id,
            network = %config.network,
            max_fee = %config.max_fee,
            "hashgraph engine ready"
        );

        Self {
            inner: Arc::new(EngineInner {
                operator: config.operator_id,
                topic_id: config.topic_id,
                max_future_drift_secs: config.max_future_drift_secs,
                log,
                sealer,
                seal_lock: Mutex::new(()),
                state: EngineState::new(config.receipt_cache_blocks),
                time_source,
            }),
        }
    }

    pub fn operator(&self) -> AccountId {
        self.inner.operator
    }

    pub fn topic_id(&self) -> TopicId {
        self.inner.topic_id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.is_closed()
    }

    /// Receipts recorded when this node sealed the block with `block_hash`.
    pub fn block_receipts(&self, block_hash: &Hash) -> Option<Vec<Receipt>> {
        self.inner.state.receipts.read().get(block_hash)
    }

    /// Log messages whose memo references `seal_hash`.
    pub async fn block_records(&self, seal_hash: &Hash) -> ConsensusResult<Vec<LogRecord>> {
        self.inner.block_records(seal_hash).await
    }
}

impl<L: LogClient + 'static> EngineInner<L> {
    async fn block_records(&self, seal_hash: &Hash) -> ConsensusResult<Vec<LogRecord>> {
        Ok(self
            .sealer
            .bounded(self.log.block_records(&self.topic_id, seal_hash))
            .await?)
    }

    /// Header checks, with `batch_parent` standing in for a parent the chain
    /// does not know yet.
    async fn verify_header_with(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        batch_parent: Option<&Header>,
        check_seal: bool,
    ) -> ConsensusResult<()> {
        if header.is_genesis() {
            return Ok(());
        }

        HeaderValidator::check_not_future(
            header,
            self.time_source.now(),
            self.max_future_drift_secs,
        )?;

        let parent = match batch_parent {
            Some(parent) if parent.number + 1 == header.number => parent.clone(),
            _ => chain
                .header(&header.parent_hash, header.number - 1)
                .ok_or(ConsensusError::UnknownParent(header.parent_hash))?,
        };
        HeaderValidator::check_against_parent(header, &parent)?;

        if check_seal {
            self.verify_seal(header).await?;
        }
        Ok(())
    }

    async fn verify_seal(&self, header: &Header) -> ConsensusResult<()> {
        let seal_hash = header.seal_hash();
        if header.tx_count > 0 && header.seal.is_none() {
            return Err(ConsensusError::MissingSeal(seal_hash));
        }

        let records = self.block_records(&seal_hash).await?;
        HeaderValidator::check_seal_records(header, &records).map_err(|reason| {
            debug!(number = header.number, %reason, "seal rejected");
            ConsensusError::SealVerification(reason)
        })
    }

    async fn run_seal(&self, block: Block, stop: &mut watch::Receiver<bool>) -> SealResult {
        let _guard = tokio::select! {
            biased;
            _ = stopped(stop) => {
                return Err(ConsensusError::SealAborted { submitted: 0 });
            }
            guard = self.seal_lock.lock() => guard,
        };
        if self.state.is_closed() {
            return Err(ConsensusError::Closed);
        }

        let started = Instant::now();
        let receipts = self.sealer.seal_block(&block, stop).await?;
        let last = receipts.last();
        let sealed = block.with_seal(HashgraphSeal {
            operator: self.operator,
            last_sequence: last.map(|r| r.sequence_number),
            consensus_timestamp: last.map(|r| r.consensus_timestamp),
        });

        let block_hash = sealed.hash();
        info!(
            number = sealed.header.number,
            hash = %hash_to_hex(&block_hash),
            messages = receipts.len(),
            "block sealed"
        );
        self.state.receipts.write().insert(block_hash, receipts);

        metrics::record_block_sealed();
        metrics::record_seal_latency(started.elapsed().as_secs_f64());
        Ok(sealed)
    }
}

fn header_tx_count(count: usize) -> ConsensusResult<u32> {
    u32::try_from(count).map_err(|_| ConsensusError::TooManyTransactions { count })
}

/// Resolves once `stop` reads `true`. Never resolves if the sender is gone
/// without having signalled.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl<L: LogClient + 'static> ConsensusEngine for HashgraphEngine<L> {
    type Api = HashgraphApi<L>;

    fn author(&self, header: &Header) -> ConsensusResult<Address> {
        header
            .seal
            .as_ref()
            .map(|seal| seal.operator.to_evm_address())
            .ok_or_else(|| ConsensusError::MissingSeal(header.seal_hash()))
    }

    async fn verify_header(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        seal: bool,
    ) -> ConsensusResult<()> {
        self.inner.verify_header_with(chain, header, None, seal).await
    }

    fn verify_headers(
        &self,
        chain: Arc<dyn ChainReader>,
        headers: Vec<Header>,
        seals: Vec<bool>,
    ) -> (watch::Sender<bool>, mpsc::Receiver<ConsensusResult<()>>) {
        let (abort, abort_rx) = watch::channel(false);
        let (results, results_rx) = mpsc::channel(headers.len().max(1));

        let Ok(handle) = Handle::try_current() else {
            for _ in &headers {
                let _ = results.try_send(Err(ConsensusError::NoRuntime));
            }
            return (abort, results_rx);
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            let mut batch: HashMap<Hash, Header> = HashMap::new();
            for (i, header) in headers.into_iter().enumerate() {
                if *abort_rx.borrow() {
                    debug!(verified = i, "header verification aborted");
                    break;
                }
                let check_seal = seals.get(i).copied().unwrap_or(false);
                let result = inner
                    .verify_header_with(
                        chain.as_ref(),
                        &header,
                        batch.get(&header.parent_hash),
                        check_seal,
                    )
                    .await;
                batch.insert(header.hash(), header);
                if results.send(result).await.is_err() {
                    break;
                }
            }
        });

        (abort, results_rx)
    }

    fn verify_uncles(&self, _chain: &dyn ChainReader, block: &Block) -> ConsensusResult<()> {
        if !block.uncles.is_empty() {
            return Err(ConsensusError::UnclesNotAllowed);
        }
        Ok(())
    }

    async fn verify_seal(&self, _chain: &dyn ChainReader, header: &Header) -> ConsensusResult<()> {
        self.inner.verify_seal(header).await
    }

    fn prepare(&self, chain: &dyn ChainReader, header: &mut Header) -> ConsensusResult<()> {
        let parent = header
            .number
            .checked_sub(1)
            .and_then(|number| chain.header(&header.parent_hash, number))
            .ok_or(ConsensusError::UnknownParent(header.parent_hash))?;

        header.coinbase = self.inner.operator.to_evm_address();
        header.seal = None;
        header.difficulty = HeaderValidator::calc_difficulty(header.timestamp, &parent);
        Ok(())
    }

    fn finalize(
        &self,
        _chain: &dyn ChainReader,
        header: &mut Header,
        state: &mut dyn StateDb,
        _transactions: &[Transaction],
        _uncles: &[Header],
    ) {
        header.state_root = state.intermediate_root();
    }

    fn finalize_and_assemble(
        &self,
        chain: &dyn ChainReader,
        mut header: Header,
        state: &mut dyn StateDb,
        transactions: Vec<Transaction>,
        uncles: Vec<Header>,
    ) -> ConsensusResult<Block> {
        if !uncles.is_empty() {
            return Err(ConsensusError::UnclesNotAllowed);
        }
        self.finalize(chain, &mut header, state, &transactions, &uncles);

        let mut block = Block::new(header, transactions);
        block.header.tx_count = header_tx_count(block.transactions.len())?;
        block.header.transactions_root = block.compute_transactions_root()?;
        Ok(block)
    }

    fn seal(
        &self,
        _chain: &dyn ChainReader,
        block: Block,
        results: mpsc::Sender<SealResult>,
        mut stop: watch::Receiver<bool>,
    ) -> ConsensusResult<()> {
        if self.inner.state.is_closed() {
            return Err(ConsensusError::Closed);
        }
        let handle = Handle::try_current().map_err(|_| ConsensusError::NoRuntime)?;

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            let number = block.header.number;
            let outcome = inner.run_seal(block, &mut stop).await;
            if let Err(e) = &outcome {
                warn!(number, error = %e, "sealing failed");
                metrics::record_seal_failed(e.reason());
            }
            if results.send(outcome).await.is_err() {
                debug!(number, "seal result dropped, receiver gone");
            }
        });
        Ok(())
    }

    fn seal_hash(&self, header: &Header) -> Hash {
        header.seal_hash()
    }

    fn calc_difficulty(&self, _chain: &dyn ChainReader, time: u64, parent: &Header) -> U256 {
        HeaderValidator::calc_difficulty(time, parent)
    }

    fn apis(&self, _chain: &dyn ChainReader) -> Vec<RpcApi<Self::Api>> {
        vec![RpcApi {
            namespace: NAMESPACE,
            version: VERSION,
            service: HashgraphApi::new(self.clone()),
            public: true,
        }]
    }

    async fn close(&self) -> ConsensusResult<()> {
        if !self.inner.state.mark_closed() {
            return Ok(());
        }
        self.inner.log.close().await?;
        info!(operator = %self.inner.operator, "hashgraph engine closed");
        Ok(())
    }
}
