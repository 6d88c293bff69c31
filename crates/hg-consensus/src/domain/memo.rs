//! Submission memos
//!
//! Every message submitted while sealing a block carries the memo
//! `"<index> <count> <blockHashHex>"`. A reader of the topic can rebuild the
//! block's transaction order from memos alone, without decoding payloads.

use shared_types::{hash_from_hex, hash_to_hex, Hash};
use std::fmt;
use std::str::FromStr;

/// Position of one transaction within the block being sealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// 0-based position within the block.
    pub index: usize,
    /// Total transactions in the block.
    pub count: usize,
    pub block_hash: Hash,
}

impl SubmissionRecord {
    pub fn new(index: usize, count: usize, block_hash: Hash) -> Self {
        Self {
            index,
            count,
            block_hash,
        }
    }

    pub fn memo(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubmissionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.index,
            self.count,
            hash_to_hex(&self.block_hash)
        )
    }
}

/// Reasons a memo read back from the log is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoParseError {
    #[error("expected 3 space-separated fields, got {0}")]
    FieldCount(usize),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("invalid block hash: {0}")]
    InvalidHash(String),

    #[error("index {index} out of range for count {count}")]
    IndexOutOfRange { index: usize, count: usize },
}

impl FromStr for SubmissionRecord {
    type Err = MemoParseError;

    fn from_str(memo: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = memo.split(' ').collect();
        let [index, count, hash] = fields.as_slice() else {
            return Err(MemoParseError::FieldCount(fields.len()));
        };

        let index: usize = index
            .parse()
            .map_err(|_| MemoParseError::InvalidNumber(index.to_string()))?;
        let count: usize = count
            .parse()
            .map_err(|_| MemoParseError::InvalidNumber(count.to_string()))?;
        let block_hash =
            hash_from_hex(hash).ok_or_else(|| MemoParseError::InvalidHash(hash.to_string()))?;

        if index >= count {
            return Err(MemoParseError::IndexOutOfRange { index, count });
        }

        Ok(Self {
            index,
            count,
            block_hash,
        })
    }
}
