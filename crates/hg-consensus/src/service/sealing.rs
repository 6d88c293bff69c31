//! Submission protocol
//!
//! One log message per transaction, strictly in block order. Each message
//! carries the canonical transaction encoding as payload and a memo naming its
//! position in the block. The first failure aborts the block. Messages already
//! accepted by the log stay there.

use crate::domain::{
    Block, ConsensusError, ConsensusResult, Hbar, LogError, LogMessage, Receipt,
    SubmissionRecord, TopicId, MAX_MESSAGE_BYTES,
};
use crate::metrics;
use crate::ports::LogClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Submits blocks to the consensus log.
pub struct Sealer<L> {
    log: Arc<L>,
    topic_id: TopicId,
    max_fee: Hbar,
    timeout: Duration,
}

impl<L: LogClient> Sealer<L> {
    pub fn new(log: Arc<L>, topic_id: TopicId, max_fee: Hbar, timeout: Duration) -> Self {
        Self {
            log,
            topic_id,
            max_fee,
            timeout,
        }
    }

    /// Submit every transaction of `block` and collect the receipts in index
    /// order.
    ///
    /// `stop` is checked before each submission. A submission already in
    /// flight is not interrupted.
    #[tracing::instrument(
        skip_all,
        fields(number = block.header.number, tx_count = block.transactions.len())
    )]
    pub async fn seal_block(
        &self,
        block: &Block,
        stop: &mut watch::Receiver<bool>,
    ) -> ConsensusResult<Vec<Receipt>> {
        let block_hash = block.header.seal_hash();
        let count = block.transactions.len();
        let mut receipts = Vec::with_capacity(count);

        for (index, transaction) in block.transactions.iter().enumerate() {
            if *stop.borrow() {
                debug!(submitted = index, "seal stopped");
                return Err(ConsensusError::SealAborted { submitted: index });
            }

            let payload = transaction.encode()?;
            if payload.len() > MAX_MESSAGE_BYTES {
                warn!(index, size = payload.len(), "transaction exceeds log message limit");
                return Err(ConsensusError::PayloadTooLarge {
                    index,
                    size: payload.len(),
                    max: MAX_MESSAGE_BYTES,
                });
            }

            let record = SubmissionRecord::new(index, count, block_hash);
            receipts.push(self.submit_one(record, payload).await?);
        }

        Ok(receipts)
    }

    /// Submit one message and wait for its success receipt.
    async fn submit_one(
        &self,
        record: SubmissionRecord,
        payload: Vec<u8>,
    ) -> ConsensusResult<Receipt> {
        let index = record.index;
        let message = LogMessage {
            topic_id: self.topic_id,
            payload,
            memo: record.memo(),
            max_fee: self.max_fee,
        };

        let transaction_id = self
            .bounded(self.log.submit(&message))
            .await
            .map_err(|source| ConsensusError::Submission { index, source })?;

        let receipt = self
            .bounded(self.log.receipt(&transaction_id))
            .await
            .map_err(|e| ConsensusError::Receipt {
                index,
                reason: e.to_string(),
            })?;

        if !receipt.status.is_success() {
            return Err(ConsensusError::Receipt {
                index,
                reason: format!("status {}", receipt.status),
            });
        }

        debug!(
            index,
            sequence = receipt.sequence_number,
            timestamp = %receipt.consensus_timestamp,
            "message accepted"
        );
        metrics::record_message_submitted();
        Ok(receipt)
    }

    pub(crate) async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, LogError>>,
    ) -> Result<T, LogError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LogError::Timeout(timeout_millis(self.timeout)))?
    }
}

/// `timeout` in whole milliseconds, saturating at `u64::MAX`.
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
