//! Messages, receipts and records exchanged with the consensus log

use super::{AccountId, Hbar, TopicId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consensus timestamp assigned by the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsensusTimestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl ConsensusTimestamp {
    pub const fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_nanos(total: u128) -> Self {
        Self {
            seconds: (total / 1_000_000_000) as u64,
            nanos: (total % 1_000_000_000) as u32,
        }
    }

    pub fn as_nanos(&self) -> u128 {
        self.seconds as u128 * 1_000_000_000 + self.nanos as u128
    }

    pub fn as_millis(&self) -> u64 {
        self.seconds
            .saturating_mul(1_000)
            .saturating_add((self.nanos / 1_000_000) as u64)
    }
}

impl fmt::Display for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Identifier of a submitted log transaction: payer plus valid-start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub account: AccountId,
    pub valid_start: ConsensusTimestamp,
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account, self.valid_start)
    }
}

/// Outcome reported by the log for a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    InvalidTopicId,
    MessageSizeTooLarge,
    InvalidSignature,
    InsufficientTxFee,
    InvalidTransactionMemo,
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "SUCCESS",
            Self::InvalidTopicId => "INVALID_TOPIC_ID",
            Self::MessageSizeTooLarge => "MESSAGE_SIZE_TOO_LARGE",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::InvalidTransactionMemo => "INVALID_TRANSACTION_MEMO",
        };
        f.write_str(name)
    }
}

/// A message ready for submission to a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogMessage {
    pub topic_id: TopicId,
    pub payload: Vec<u8>,
    pub memo: String,
    pub max_fee: Hbar,
}

/// Receipt returned by the log for one submission.
///
/// Sequence number and consensus timestamp are only meaningful when
/// `status` is [`ReceiptStatus::Success`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub status: ReceiptStatus,
    pub topic_id: TopicId,
    pub sequence_number: u64,
    pub consensus_timestamp: ConsensusTimestamp,
}

/// A message as read back from the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub topic_id: TopicId,
    pub sequence_number: u64,
    pub consensus_timestamp: ConsensusTimestamp,
    pub payer: AccountId,
    pub memo: String,
    pub payload: Vec<u8>,
}
