//! Mining loop
//!
//! The miner idles until a pool-updated signal arrives. Every signal
//! cancels any in-flight attempt; if the miner is active and the pool has
//! met its priority threshold, a fresh attempt snapshots the mining pool,
//! synthesizes a coinbase, and searches nonces under a cancellation token
//! that is checked between every candidate. A block is published only when
//! the search succeeds and the token is still live.

use crate::config::Config;
use crate::core::block::Block;
use crate::core::transaction::{Transaction, TransactionOutput};
use crate::mining::tx_pool::TxPool;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

pub struct Miner {
    conf: Config,
    /// Hex public key the coinbase pays out to
    pub_key: String,
    /// Pool of candidate transactions
    pub tx_pool: Arc<RwLock<TxPool>>,
    /// Hash of the current main-chain tip, referenced by candidate blocks
    prev_hash: RwLock<String>,
    /// Current main-chain length, drives subsidy halving
    chain_length: AtomicU32,
    /// Whether pool-updated signals may start attempts
    pub active: AtomicBool,
    /// Whether a nonce search is in flight
    pub mining: AtomicBool,
    pool_updated_tx: mpsc::Sender<()>,
    pool_updated_rx: Mutex<Option<mpsc::Receiver<()>>>,
    /// Outbound channel to the network layer
    publish: mpsc::Sender<Block>,
    /// Loopback into the node's own block-handling path
    local: mpsc::Sender<Block>,
}

impl Miner {
    pub fn new(
        conf: Config,
        pub_key: String,
        prev_hash: String,
        chain_length: u32,
        publish: mpsc::Sender<Block>,
        local: mpsc::Sender<Block>,
    ) -> Arc<Self> {
        let tx_pool = Arc::new(RwLock::new(TxPool::new(&conf)));
        let (pool_updated_tx, pool_updated_rx) = mpsc::channel(1);
        Arc::new(Self {
            conf,
            pub_key,
            tx_pool,
            prev_hash: RwLock::new(prev_hash),
            chain_length: AtomicU32::new(chain_length),
            active: AtomicBool::new(false),
            mining: AtomicBool::new(false),
            pool_updated_tx,
            pool_updated_rx: Mutex::new(Some(pool_updated_rx)),
            publish,
            local,
        })
    }

    /// Spawn the mining loop. The loop runs until the signal channel
    /// closes, which happens when the miner itself is dropped.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let miner = Arc::clone(self);
        tokio::spawn(miner.mine())
    }

    /// Enable or disable mining. A disabled miner still cancels in-flight
    /// work on each signal.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Signal that the pool's membership may have changed. Signals
    /// coalesce: one pending notification is enough.
    pub fn signal_pool_updated(&self) {
        let _ = self.pool_updated_tx.try_send(());
    }

    /// Queue a validated transaction and wake the mining loop.
    pub async fn handle_transaction(&self, tx: Transaction) {
        self.tx_pool.write().await.add(tx);
        self.signal_pool_updated();
    }

    /// Absorb a block accepted onto the chain: track the new tip and
    /// length, drop confirmed transactions from the pool, and wake the
    /// mining loop.
    pub async fn handle_block(&self, tip_hash: String, chain_length: u32, confirmed: &[Transaction]) {
        *self.prev_hash.write().await = tip_hash;
        self.chain_length.store(chain_length, Ordering::SeqCst);
        self.tx_pool.write().await.check_transactions(confirmed);
        self.signal_pool_updated();
    }

    /// The static difficulty target mined blocks must satisfy
    pub fn difficulty_target(&self) -> String {
        self.conf.pow_difficulty.clone()
    }

    async fn mine(self: Arc<Self>) {
        let Some(mut rx) = self.pool_updated_rx.lock().await.take() else {
            return;
        };
        let mut cancel = CancellationToken::new();
        while rx.recv().await.is_some() {
            cancel.cancel();
            if !self.active.load(Ordering::SeqCst) {
                continue;
            }
            cancel = CancellationToken::new();
            let miner = Arc::clone(&self);
            let token = cancel.clone();
            tokio::spawn(async move {
                miner.attempt(token).await;
            });
        }
        cancel.cancel();
    }

    /// One mining attempt: pack the pool, build a candidate block, search
    /// nonces, publish on success.
    async fn attempt(&self, token: CancellationToken) {
        if !self.tx_pool.read().await.priority_met() {
            return;
        }
        self.mining.store(true, Ordering::SeqCst);
        let pool = self
            .tx_pool
            .read()
            .await
            .mining_pool(self.conf.block_pack_size);
        let Some(coinbase) = self.coinbase(&pool) else {
            self.mining.store(false, Ordering::SeqCst);
            return;
        };
        let mut transactions = vec![coinbase];
        transactions.extend(pool);

        let prev_hash = self.prev_hash.read().await.clone();
        let mut block = Block::new(prev_hash, transactions, self.difficulty_target());
        let solved = self.solve(&token, &mut block);
        self.mining.store(false, Ordering::SeqCst);

        if solved && !token.is_cancelled() {
            debug!("mined block {} ({} txs)", &block.hash()[..8], block.transactions.len());
            let _ = self.publish.send(block.clone()).await;
            let _ = self.local.send(block).await;
        }
    }

    /// Scan nonces up to the configured limit, checking cancellation
    /// between every candidate. Returns whether a satisfying nonce was
    /// found.
    fn solve(&self, token: &CancellationToken, block: &mut Block) -> bool {
        let target = self.difficulty_target();
        for nonce in 0..self.conf.nonce_limit {
            if token.is_cancelled() {
                return false;
            }
            block.header.nonce = nonce;
            if block.satisfies_pow(&target) {
                return true;
            }
        }
        false
    }

    /// Synthesize the coinbase for a mining pool: the halved subsidy plus
    /// all fees, paid to the miner's key. An empty pool yields none.
    pub fn coinbase(&self, txs: &[Transaction]) -> Option<Transaction> {
        if txs.is_empty() {
            return None;
        }
        let fees: u32 = txs
            .iter()
            .map(|t| t.sum_inputs().saturating_sub(t.sum_outputs()))
            .sum();
        let halvings = (self.chain_length.load(Ordering::SeqCst) / self.conf.subsidy_halving_rate)
            .min(self.conf.max_halvings);
        let mint = self.conf.init_subsidy >> halvings;
        Some(Transaction::new(
            self.conf.version,
            vec![],
            vec![TransactionOutput::new(mint + fees, &self.pub_key)],
            0,
        ))
    }
}
