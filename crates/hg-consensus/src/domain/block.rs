//! Block domain entities

use super::{AccountId, ConsensusTimestamp};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{transactions_root, Address, Hash, Transaction, U256};

/// Seal attached to a header once its transactions are ordered on the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashgraphSeal {
    /// Operator account that paid for (and signed) the submissions.
    pub operator: AccountId,
    /// Sequence number of the last message of the block (index N-1).
    /// `None` for blocks without transactions.
    pub last_sequence: Option<u64>,
    /// Consensus timestamp of that last message.
    pub consensus_timestamp: Option<ConsensusTimestamp>,
}

/// Block header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: Hash,
    pub number: u64,
    /// Unix seconds proposed by the producer.
    pub timestamp: u64,
    pub coinbase: Address,
    pub state_root: Hash,
    pub transactions_root: Hash,
    pub tx_count: u32,
    pub difficulty: U256,
    pub extra: Vec<u8>,
    pub seal: Option<HashgraphSeal>,
}

impl Header {
    fn hash_unsealed_fields(&self, hasher: &mut Keccak256) {
        let mut difficulty = [0u8; 32];
        self.difficulty.to_big_endian(&mut difficulty);

        hasher.update(self.parent_hash);
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.coinbase);
        hasher.update(self.state_root);
        hasher.update(self.transactions_root);
        hasher.update(self.tx_count.to_be_bytes());
        hasher.update(difficulty);
        hasher.update((self.extra.len() as u64).to_be_bytes());
        hasher.update(&self.extra);
    }

    /// Hash of the header without its seal.
    ///
    /// This is the hash carried in every submission memo.
    pub fn seal_hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        self.hash_unsealed_fields(&mut hasher);
        hasher.finalize().into()
    }

    /// Hash of the full header.
    ///
    /// Equal to [`Header::seal_hash`] until a seal is attached.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        self.hash_unsealed_fields(&mut hasher);
        if let Some(seal) = &self.seal {
            hasher.update(seal.operator.shard.to_be_bytes());
            hasher.update(seal.operator.realm.to_be_bytes());
            hasher.update(seal.operator.num.to_be_bytes());
            hasher.update(seal.last_sequence.unwrap_or_default().to_be_bytes());
            let ts = seal.consensus_timestamp.unwrap_or_default();
            hasher.update(ts.seconds.to_be_bytes());
            hasher.update(ts.nanos.to_be_bytes());
        }
        hasher.finalize().into()
    }

    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}

/// A block: header plus ordered transactions.
///
/// Uncles are carried only so the engine can reject them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub uncles: Vec<Header>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
            uncles: Vec::new(),
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Transactions root recomputed from the block body.
    pub fn compute_transactions_root(&self) -> Result<Hash, serde_json::Error> {
        let hashes = self
            .transactions
            .iter()
            .map(Transaction::hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transactions_root(&hashes))
    }

    /// Copy of this block with the given seal attached.
    pub fn with_seal(&self, seal: HashgraphSeal) -> Self {
        let mut sealed = self.clone();
        sealed.header.seal = Some(seal);
        sealed
    }
}
