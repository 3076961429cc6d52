//! Candidate-transaction pool for the miner
//!
//! Holds validated transactions ranked by fee priority and tracks the
//! cumulative priority that gates mining. Selection for a block takes the
//! highest-priority prefix that fits the pack-size budget.

use crate::config::Config;
use crate::core::transaction::Transaction;
use crate::core::tx_heap::TxHeap;
use log::debug;

/// Size reserved for the coinbase when packing a block.
pub const COINBASE_SIZE_RESERVE: u32 = 100;

/// Fee priority of a transaction: `max(1, fees * 100 / size)`, where
/// `fees = sum(inputs) - sum(outputs)`. A coinbase has priority 0; the
/// pool clamps whatever it stores to at least 1.
pub fn calc_priority(tx: &Transaction) -> u32 {
    if tx.is_coinbase() {
        return 0;
    }
    let fees = tx.sum_inputs().saturating_sub(tx.sum_outputs());
    (fees.saturating_mul(100) / tx.size().max(1)).max(1)
}

/// The pool of transactions the miner may mine.
#[derive(Debug)]
pub struct TxPool {
    cur_priority: u32,
    priority_threshold: u32,
    heap: TxHeap,
    cap: u32,
}

impl TxPool {
    pub fn new(conf: &Config) -> Self {
        Self {
            cur_priority: 0,
            priority_threshold: conf.priority_threshold,
            heap: TxHeap::new(),
            cap: conf.tx_pool_cap,
        }
    }

    /// Number of transactions currently pooled
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Current cumulative priority
    pub fn cumulative_priority(&self) -> u32 {
        self.cur_priority
    }

    /// Whether the pool has accumulated enough priority to start mining
    pub fn priority_met(&self) -> bool {
        self.cur_priority >= self.priority_threshold
    }

    /// Queue a transaction. A full pool drops the transaction.
    pub fn add(&mut self, tx: Transaction) {
        if self.heap.len() as u32 >= self.cap {
            debug!("tx pool full, dropped {}", &tx.hash()[..8]);
            return;
        }
        let priority = calc_priority(&tx).max(1);
        self.cur_priority = self.cur_priority.saturating_add(priority);
        self.heap.add(priority, tx);
    }

    /// Remove any pooled transaction that appears in `txs` (by hash) and
    /// release its priority.
    pub fn check_transactions(&mut self, txs: &[Transaction]) {
        let removed = self.heap.remove(txs);
        if removed.is_empty() {
            return;
        }
        let released: u32 = removed.iter().map(|t| calc_priority(t).max(1)).sum();
        self.cur_priority = self.cur_priority.saturating_sub(released);
    }

    /// Select the highest-priority prefix of the pool whose cumulative
    /// size, after reserving room for a coinbase, stays under the pack
    /// budget. Selection stops at the first transaction that would
    /// overflow.
    pub fn mining_pool(&self, pack_size: u32) -> Vec<Transaction> {
        let mut selected = Vec::new();
        let mut size = COINBASE_SIZE_RESERVE;
        for tx in self.heap.iter() {
            size += tx.size();
            if size < pack_size {
                selected.push(tx.clone());
            } else {
                break;
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{TransactionInput, TransactionOutput};

    fn conf() -> Config {
        Config {
            priority_threshold: 100,
            tx_pool_cap: 3,
            ..Config::default()
        }
    }

    /// A transaction paying `fee` with a distinguishing output key
    fn tx_with_fee(fee: u32, tag: &str) -> Transaction {
        Transaction::new(
            0,
            vec![TransactionInput::new("src", 0, "pk", 100)],
            vec![TransactionOutput::new(100 - fee, tag)],
            0,
        )
    }

    #[test]
    fn test_calc_priority() {
        let tx = tx_with_fee(10, "a");
        assert_eq!(calc_priority(&tx), (10 * 100 / tx.size()).max(1));
        // Tiny fee still ranks at 1
        assert_eq!(calc_priority(&tx_with_fee(0, "a")), 1);
        // Coinbase ranks at 0
        let cb = Transaction::new(0, vec![], vec![TransactionOutput::new(50, "m")], 0);
        assert_eq!(calc_priority(&cb), 0);
    }

    #[test]
    fn test_add_and_priority_met() {
        let mut pool = TxPool::new(&conf());
        assert!(!pool.priority_met());
        pool.add(tx_with_fee(50, "a"));
        assert_eq!(pool.len(), 1);
        assert!(pool.priority_met());
    }

    #[test]
    fn test_full_pool_drops() {
        let mut pool = TxPool::new(&conf());
        for i in 0..5 {
            pool.add(tx_with_fee(10, &format!("t{}", i)));
        }
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_priority_round_trip() {
        let mut pool = TxPool::new(&conf());
        let before = pool.cumulative_priority();
        let a = tx_with_fee(20, "a");
        let b = tx_with_fee(5, "b");
        pool.add(a.clone());
        pool.add(b.clone());
        assert!(pool.cumulative_priority() > before);

        pool.check_transactions(&[a, b]);
        assert_eq!(pool.cumulative_priority(), before);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_check_transactions_ignores_unknown() {
        let mut pool = TxPool::new(&conf());
        pool.add(tx_with_fee(20, "a"));
        let pri = pool.cumulative_priority();
        pool.check_transactions(&[tx_with_fee(20, "elsewhere")]);
        assert_eq!(pool.cumulative_priority(), pri);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_mining_pool_respects_pack_size() {
        let mut pool = TxPool::new(&conf());
        let big = tx_with_fee(50, "big");
        let small = tx_with_fee(5, "small");
        pool.add(big.clone());
        pool.add(small.clone());

        // Generous budget takes both, highest priority first
        let all = pool.mining_pool(10_000);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], big);

        // Budget that only covers the reserve plus the first transaction
        let tight = pool.mining_pool(COINBASE_SIZE_RESERVE + big.size() + 1);
        assert_eq!(tight, vec![big]);

        // Budget below the coinbase reserve selects nothing
        assert!(pool.mining_pool(COINBASE_SIZE_RESERVE).is_empty());
    }
}
