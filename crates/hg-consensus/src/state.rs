use crate::domain::Receipt;
use parking_lot::RwLock;
use shared_types::Hash;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

/// Receipts of recently sealed blocks, keyed by sealed block hash.
///
/// Holds at most `capacity` blocks. The oldest block is evicted first. The
/// consensus log stays the source of truth for anything evicted.
pub struct ReceiptIndex {
    capacity: usize,
    order: VecDeque<Hash>,
    receipts: HashMap<Hash, Vec<Receipt>>,
}

impl ReceiptIndex {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            receipts: HashMap::new(),
        }
    }

    pub fn insert(&mut self, block_hash: Hash, receipts: Vec<Receipt>) {
        if self.capacity == 0 {
            return;
        }
        if self.receipts.insert(block_hash, receipts).is_none() {
            self.order.push_back(block_hash);
        }
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.receipts.remove(&evicted);
            }
        }
    }

    pub fn get(&self, block_hash: &Hash) -> Option<Vec<Receipt>> {
        self.receipts.get(block_hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Mutable state of the engine.
pub struct EngineState {
    pub receipts: RwLock<ReceiptIndex>,
    closed: AtomicBool,
}

impl EngineState {
    pub fn new(receipt_capacity: usize) -> Self {
        Self {
            receipts: RwLock::new(ReceiptIndex::new(receipt_capacity)),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark the engine closed. Returns `true` only for the first call.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }
}
