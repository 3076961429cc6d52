//! Max-priority transaction queue
//!
//! Shared by the mining pool (fee priorities) and the wallet's liminal
//! queue (age priorities). Entries are kept sorted by priority, with
//! insertion order breaking ties, so iteration and block packing are
//! deterministic. Removal is by transaction identity (hash).

use crate::core::transaction::Transaction;
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct HeapEntry {
    priority: u32,
    seq: u64,
    tx_hash: String,
    tx: Transaction,
}

/// Priority queue over transactions, highest priority first.
#[derive(Debug, Default)]
pub struct TxHeap {
    entries: Vec<HeapEntry>,
    next_seq: u64,
}

impl TxHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a transaction with the given priority. Equal priorities keep
    /// arrival order.
    pub fn add(&mut self, priority: u32, tx: Transaction) {
        let entry = HeapEntry {
            priority,
            seq: self.next_seq,
            tx_hash: tx.hash(),
            tx,
        };
        self.next_seq += 1;
        let pos = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Remove every queued transaction whose hash matches one of `txs`.
    /// Returns the removed transactions in queue order.
    pub fn remove(&mut self, txs: &[Transaction]) -> Vec<Transaction> {
        let targets: HashSet<String> = txs.iter().map(|t| t.hash()).collect();
        if targets.is_empty() {
            return Vec::new();
        }
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            if targets.contains(&e.tx_hash) {
                removed.push(e.tx.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Increment every entry's priority by one. The uniform bump preserves
    /// ordering.
    pub fn increment_all(&mut self) {
        for entry in &mut self.entries {
            entry.priority = entry.priority.saturating_add(1);
        }
    }

    /// Remove and return every transaction whose priority is strictly above
    /// the threshold.
    pub fn remove_above(&mut self, threshold: u32) -> Vec<Transaction> {
        let split = self
            .entries
            .iter()
            .position(|e| e.priority <= threshold)
            .unwrap_or(self.entries.len());
        self.entries.drain(..split).map(|e| e.tx).collect()
    }

    /// Iterate queued transactions, highest priority first.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().map(|e| &e.tx)
    }
}
