//! Liminal transaction queue
//!
//! Transactions the wallet has emitted but not yet seen confirmed at safe
//! depth. Each safe-depth block notification ages every queued transaction
//! by one; transactions that age past the replay threshold are evicted so
//! the wallet can resend them.

use crate::config::Config;
use crate::core::transaction::Transaction;
use crate::core::tx_heap::TxHeap;

#[derive(Debug)]
pub struct LiminalTxs {
    heap: TxHeap,
    replay_threshold: u32,
}

impl LiminalTxs {
    pub fn new(conf: &Config) -> Self {
        Self {
            heap: TxHeap::new(),
            replay_threshold: conf.tx_replay_thresh,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queue a freshly emitted transaction at age 0.
    pub fn add(&mut self, tx: Transaction) {
        self.heap.add(0, tx);
    }

    /// Absorb a safe-depth block: drop queued transactions the block
    /// confirmed, age the rest by one, and evict everything whose age
    /// exceeds the replay threshold.
    ///
    /// Returns `(stale, confirmed)`: the evicted transactions to resend,
    /// and the duplicates removed because the block carried them.
    pub fn check(&mut self, txs: &[Transaction]) -> (Vec<Transaction>, Vec<Transaction>) {
        let confirmed = self.heap.remove(txs);
        self.heap.increment_all();
        let stale = self.heap.remove_above(self.replay_threshold);
        (stale, confirmed)
    }
}
