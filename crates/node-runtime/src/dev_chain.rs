//! # Development Chain
//!
//! Minimal in-memory chain and state used by the dev node. Headers are kept
//! in insertion order. The highest header is the head.

use hg_consensus::{ChainReader, Header, StateDb};
use parking_lot::RwLock;
use shared_types::{keccak256, transactions_root, Hash, U256, ZERO_ADDRESS, ZERO_HASH};
use std::collections::HashMap;

#[derive(Default)]
struct Headers {
    by_hash: HashMap<Hash, Header>,
    canonical: Vec<Hash>,
}

/// In-memory header store.
#[derive(Default)]
pub struct DevChain {
    headers: RwLock<Headers>,
}

impl DevChain {
    /// A chain holding only the genesis header stamped at `timestamp`.
    pub fn with_genesis(timestamp: u64) -> Self {
        let chain = Self::default();
        chain.insert(genesis_header(timestamp));
        chain
    }

    /// Append `header` as the new head.
    pub fn insert(&self, header: Header) {
        let hash = header.hash();
        let mut headers = self.headers.write();
        headers.canonical.push(hash);
        headers.by_hash.insert(hash, header);
    }

    pub fn height(&self) -> u64 {
        self.headers.read().canonical.len().saturating_sub(1) as u64
    }
}

impl ChainReader for DevChain {
    fn current_header(&self) -> Option<Header> {
        let headers = self.headers.read();
        headers
            .canonical
            .last()
            .and_then(|hash| headers.by_hash.get(hash))
            .cloned()
    }

    fn header(&self, hash: &Hash, number: u64) -> Option<Header> {
        self.headers
            .read()
            .by_hash
            .get(hash)
            .filter(|header| header.number == number)
            .cloned()
    }

    fn header_by_number(&self, number: u64) -> Option<Header> {
        let headers = self.headers.read();
        headers
            .canonical
            .get(number as usize)
            .and_then(|hash| headers.by_hash.get(hash))
            .cloned()
    }
}

pub fn genesis_header(timestamp: u64) -> Header {
    Header {
        parent_hash: ZERO_HASH,
        number: 0,
        timestamp,
        coinbase: ZERO_ADDRESS,
        state_root: ZERO_HASH,
        transactions_root: transactions_root(std::iter::empty::<&Hash>()),
        tx_count: 0,
        difficulty: U256::one(),
        extra: b"hashgraph-dev".to_vec(),
        seal: None,
    }
}

/// State stub whose root is derived from the block number alone.
pub struct DevState {
    number: u64,
}

impl DevState {
    pub fn at(number: u64) -> Self {
        Self { number }
    }
}

impl StateDb for DevState {
    fn intermediate_root(&mut self) -> Hash {
        keccak256(self.number.to_be_bytes())
    }
}
