//! Error types for the hashgraph consensus engine

use super::{Network, ReceiptStatus};
use crate::config::ConfigError;
use shared_types::Hash;

/// Errors reported by a [`LogClient`](crate::ports::LogClient).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error("log client is closed")]
    Closed,

    #[error("transaction rejected at precheck: {0}")]
    Precheck(ReceiptStatus),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("network mismatch: log serves {served}, session requested {requested}")]
    NetworkMismatch { served: Network, requested: Network },
}

/// Consensus engine error types
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transaction {index} too large for a log message: {size} bytes > {max} bytes")]
    PayloadTooLarge { index: usize, size: usize, max: usize },

    #[error("Submission of transaction {index} failed: {source}")]
    Submission {
        index: usize,
        #[source]
        source: LogError,
    },

    #[error("Receipt for transaction {index} failed: {reason}")]
    Receipt { index: usize, reason: String },

    #[error("Engine is closed")]
    Closed,

    #[error("Seal verification failed: {0}")]
    SealVerification(String),

    #[error("Sealing aborted after {submitted} submissions")]
    SealAborted { submitted: usize },

    #[error("Unknown parent block: {0:?}")]
    UnknownParent(Hash),

    #[error("Invalid timestamp: block {block} < parent {parent}")]
    InvalidTimestamp { block: u64, parent: u64 },

    #[error("Timestamp too far in future: {timestamp}, current is {current}")]
    FutureTimestamp { timestamp: u64, current: u64 },

    #[error("Invalid difficulty: expected {expected}, got {actual}")]
    InvalidDifficulty { expected: String, actual: String },

    #[error("Uncles not allowed")]
    UnclesNotAllowed,

    #[error("Header is not sealed: {0:?}")]
    MissingSeal(Hash),

    #[error("Block holds {count} transactions, more than a header can count")]
    TooManyTransactions { count: usize },

    #[error("Transaction encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Log query failed: {0}")]
    Log(LogError),

    #[error("No async runtime available to run the seal task")]
    NoRuntime,
}

impl ConsensusError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Submission { .. } => "submission",
            Self::Receipt { .. } => "receipt",
            Self::Closed => "closed",
            Self::SealVerification(_) => "seal_verification",
            Self::SealAborted { .. } => "aborted",
            Self::UnknownParent(_) => "unknown_parent",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::FutureTimestamp { .. } => "future_timestamp",
            Self::InvalidDifficulty { .. } => "invalid_difficulty",
            Self::UnclesNotAllowed => "uncles",
            Self::MissingSeal(_) => "missing_seal",
            Self::TooManyTransactions { .. } => "too_many_transactions",
            Self::Encoding(_) => "encoding",
            Self::Log(_) => "log",
            Self::NoRuntime => "no_runtime",
        }
    }
}

impl From<LogError> for ConsensusError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Closed => Self::Closed,
            other => Self::Log(other),
        }
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
