//! In-memory consensus log adapter
//!
//! A single-process stand-in for the consensus log service, used by dev nodes
//! and tests. It keeps the observable behaviour of the real service:
//!
//! - per-topic sequence numbers start at 1 and have no gaps;
//! - consensus timestamps strictly increase across all topics;
//! - every message must carry a valid operator signature;
//! - fee and memo problems fail at precheck (on submit), while bad topics and
//!   oversized payloads produce failure receipts.

use crate::config::OperatorKey;
use crate::domain::{
    AccountId, ConsensusTimestamp, Hbar, LogError, LogMessage, LogRecord, Network, Receipt,
    ReceiptStatus, SubmissionRecord, TopicId, TransactionId, MAX_MESSAGE_BYTES,
};
use crate::ports::LogClient;
use async_trait::async_trait;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use parking_lot::RwLock;
use shared_types::Hash;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Longest memo the log accepts, in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

/// Default fee charged per message (0.0001 ℏ).
pub const DEFAULT_MESSAGE_FEE: Hbar = Hbar::from_tinybars(10_000);

#[derive(Default)]
struct LogState {
    topics: HashMap<TopicId, Vec<LogRecord>>,
    receipts: HashMap<TransactionId, Receipt>,
    accounts: HashMap<AccountId, VerifyingKey>,
    last_timestamp_nanos: u128,
}

impl LogState {
    fn next_timestamp(&mut self) -> ConsensusTimestamp {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        self.last_timestamp_nanos = now.max(self.last_timestamp_nanos + 1);
        ConsensusTimestamp::from_nanos(self.last_timestamp_nanos)
    }
}

/// The log service itself. Cloning shares the same log.
#[derive(Clone)]
pub struct InMemoryConsensusLog {
    network: Network,
    message_fee: Hbar,
    state: Arc<RwLock<LogState>>,
}

impl InMemoryConsensusLog {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            message_fee: DEFAULT_MESSAGE_FEE,
            state: Arc::new(RwLock::new(LogState::default())),
        }
    }

    pub fn with_message_fee(mut self, fee: Hbar) -> Self {
        self.message_fee = fee;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Make `topic_id` available for submissions.
    pub fn create_topic(&self, topic_id: TopicId) {
        self.state.write().topics.entry(topic_id).or_default();
    }

    /// All messages recorded on a topic, in consensus order.
    pub fn topic_messages(&self, topic_id: &TopicId) -> Vec<LogRecord> {
        self.state
            .read()
            .topics
            .get(topic_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn message_count(&self, topic_id: &TopicId) -> usize {
        self.state
            .read()
            .topics
            .get(topic_id)
            .map_or(0, Vec::len)
    }

    /// Open a session for `operator` on `network`.
    ///
    /// The operator's public key is registered on first use. A later session
    /// for the same account must use the same key.
    pub fn connect(
        &self,
        network: Network,
        operator: AccountId,
        key: &OperatorKey,
    ) -> Result<InMemoryLogClient, LogError> {
        if network != self.network {
            return Err(LogError::NetworkMismatch {
                served: self.network,
                requested: network,
            });
        }

        let public_key = key.public_key();
        {
            let mut state = self.state.write();
            let registered = state.accounts.entry(operator).or_insert(public_key);
            if *registered != public_key {
                return Err(LogError::Transport(format!(
                    "key does not match account {operator}"
                )));
            }
        }

        tracing::debug!(%network, %operator, "consensus log session opened");

        Ok(InMemoryLogClient {
            log: self.clone(),
            operator,
            key: key.clone(),
            closed: AtomicBool::new(false),
        })
    }

    fn accept(
        &self,
        payer: AccountId,
        message: &LogMessage,
        signature: &Signature,
    ) -> Result<TransactionId, LogError> {
        if message.max_fee < self.message_fee {
            return Err(LogError::Precheck(ReceiptStatus::InsufficientTxFee));
        }
        if message.memo.len() > MAX_MEMO_BYTES {
            return Err(LogError::Precheck(ReceiptStatus::InvalidTransactionMemo));
        }

        let mut state = self.state.write();
        let consensus_timestamp = state.next_timestamp();
        let transaction_id = TransactionId {
            account: payer,
            valid_start: consensus_timestamp,
        };

        let signed_by_payer = state
            .accounts
            .get(&payer)
            .map(|key| key.verify(&signing_bytes(message), signature).is_ok())
            .unwrap_or(false);

        let status = if !signed_by_payer {
            ReceiptStatus::InvalidSignature
        } else if !state.topics.contains_key(&message.topic_id) {
            ReceiptStatus::InvalidTopicId
        } else if message.payload.len() > MAX_MESSAGE_BYTES {
            ReceiptStatus::MessageSizeTooLarge
        } else {
            ReceiptStatus::Success
        };

        let mut sequence_number = 0;
        if status.is_success() {
            let records = state.topics.entry(message.topic_id).or_default();
            sequence_number = records.len() as u64 + 1;
            records.push(LogRecord {
                topic_id: message.topic_id,
                sequence_number,
                consensus_timestamp,
                payer,
                memo: message.memo.clone(),
                payload: message.payload.clone(),
            });
        }

        state.receipts.insert(
            transaction_id,
            Receipt {
                transaction_id,
                status,
                topic_id: message.topic_id,
                sequence_number,
                consensus_timestamp,
            },
        );

        Ok(transaction_id)
    }
}

/// Bytes the operator signs for one message.
fn signing_bytes(message: &LogMessage) -> Vec<u8> {
    let topic = message.topic_id.to_string();
    let mut bytes =
        Vec::with_capacity(topic.len() + message.memo.len() + message.payload.len() + 2);
    bytes.extend_from_slice(topic.as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(message.memo.as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(&message.payload);
    bytes
}

/// Operator session on an [`InMemoryConsensusLog`].
pub struct InMemoryLogClient {
    log: InMemoryConsensusLog,
    operator: AccountId,
    key: OperatorKey,
    closed: AtomicBool,
}

impl InMemoryLogClient {
    pub fn operator(&self) -> AccountId {
        self.operator
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), LogError> {
        if self.is_closed() {
            return Err(LogError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl LogClient for InMemoryLogClient {
    async fn submit(&self, message: &LogMessage) -> Result<TransactionId, LogError> {
        self.ensure_open()?;
        let signature = self.key.sign(&signing_bytes(message));
        self.log.accept(self.operator, message, &signature)
    }

    async fn receipt(&self, transaction_id: &TransactionId) -> Result<Receipt, LogError> {
        self.ensure_open()?;
        self.log
            .state
            .read()
            .receipts
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| LogError::UnknownTransaction(transaction_id.to_string()))
    }

    async fn block_records(
        &self,
        topic_id: &TopicId,
        block_hash: &Hash,
    ) -> Result<Vec<LogRecord>, LogError> {
        self.ensure_open()?;
        let state = self.log.state.read();
        let Some(records) = state.topics.get(topic_id) else {
            return Ok(Vec::new());
        };

        Ok(records
            .iter()
            .filter(|record| {
                record
                    .memo
                    .parse::<SubmissionRecord>()
                    .map(|parsed| parsed.block_hash == *block_hash)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn close(&self) -> Result<(), LogError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(operator = %self.operator, "consensus log session closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::TEST_KEY;

    const TOPIC: TopicId = TopicId::new(0, 0, 77);
    const OPERATOR: AccountId = AccountId::new(0, 0, 1001);

    fn key() -> OperatorKey {
        OperatorKey::from_hex(TEST_KEY).unwrap()
    }

    fn message(memo: &str, payload: &[u8]) -> LogMessage {
        LogMessage {
            topic_id: TOPIC,
            payload: payload.to_vec(),
            memo: memo.to_string(),
            max_fee: Hbar::from_tinybars(100_000_000),
        }
    }

    fn connected() -> (InMemoryConsensusLog, InMemoryLogClient) {
        let log = InMemoryConsensusLog::new(Network::Testnet);
        log.create_topic(TOPIC);
        let client = log.connect(Network::Testnet, OPERATOR, &key()).unwrap();
        (log, client)
    }

    #[tokio::test]
    async fn test_submit_assigns_sequence_and_timestamps() {
        let (log, client) = connected();

        let first = client.submit(&message("a", b"one")).await.unwrap();
        let second = client.submit(&message("b", b"two")).await.unwrap();

        let r1 = client.receipt(&first).await.unwrap();
        let r2 = client.receipt(&second).await.unwrap();
        assert_eq!(r1.status, ReceiptStatus::Success);
        assert_eq!(r1.sequence_number, 1);
        assert_eq!(r2.sequence_number, 2);
        assert!(r2.consensus_timestamp > r1.consensus_timestamp);

        let records = log.topic_messages(&TOPIC);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payer, OPERATOR);
        assert_eq!(records[1].payload, b"two");
    }

    #[tokio::test]
    async fn test_unknown_topic_yields_failure_receipt() {
        let (log, client) = connected();
        let mut msg = message("a", b"x");
        msg.topic_id = TopicId::new(0, 0, 999);

        let id = client.submit(&msg).await.unwrap();
        let receipt = client.receipt(&id).await.unwrap();
        assert_eq!(receipt.status, ReceiptStatus::InvalidTopicId);
        assert_eq!(log.message_count(&TOPIC), 0);
    }

    #[tokio::test]
    async fn test_fee_below_network_fee_fails_precheck() {
        let (log, client) = connected();
        let mut msg = message("a", b"x");
        msg.max_fee = Hbar::from_tinybars(1);

        assert_eq!(
            client.submit(&msg).await,
            Err(LogError::Precheck(ReceiptStatus::InsufficientTxFee))
        );
        assert_eq!(log.message_count(&TOPIC), 0);
    }

    #[tokio::test]
    async fn test_oversized_payload_yields_failure_receipt() {
        let (_log, client) = connected();
        let id = client
            .submit(&message("a", &vec![0u8; MAX_MESSAGE_BYTES + 1]))
            .await
            .unwrap();
        assert_eq!(
            client.receipt(&id).await.unwrap().status,
            ReceiptStatus::MessageSizeTooLarge
        );
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_submit() {
        let (_log, client) = connected();
        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(client.is_closed());
        assert_eq!(
            client.submit(&message("a", b"x")).await,
            Err(LogError::Closed)
        );
    }

    #[tokio::test]
    async fn test_block_records_filters_by_memo_hash() {
        let (_log, client) = connected();
        let ours = [0x11u8; 32];
        let other = [0x22u8; 32];

        for (hash, payload) in [(ours, b"a"), (other, b"b"), (ours, b"c")] {
            let memo = SubmissionRecord::new(0, 1, hash).memo();
            client.submit(&message(&memo, payload)).await.unwrap();
        }
        client.submit(&message("free text", b"d")).await.unwrap();

        let records = client.block_records(&TOPIC, &ours).await.unwrap();
        let payloads: Vec<_> = records.iter().map(|r| r.payload.clone()).collect();
        assert_eq!(payloads, vec![b"a".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_connect_rejects_wrong_network() {
        let log = InMemoryConsensusLog::new(Network::Mainnet);
        assert!(matches!(
            log.connect(Network::Testnet, OPERATOR, &key()),
            Err(LogError::NetworkMismatch { .. })
        ));
    }
}
