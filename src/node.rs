//! Node orchestration
//!
//! The node owns the chain, the miner, and the wallet, and implements the
//! core data flow: inbound blocks and transactions run through validation,
//! accepted blocks land in the chain and fan out to the miner (new tip,
//! chain length, confirmed transactions) and the wallet (safe-depth
//! notification). Blocks the miner finds loop back through the same
//! inbound path. The network layer sits on the other side of [`NodeIo`].

use crate::config::Config;
use crate::core::block::Block;
use crate::core::blockchain::Blockchain;
use crate::core::transaction::Transaction;
use crate::crypto::KeyPair;
use crate::mining::Miner;
use crate::validation;
use crate::wallet::{TxRequest, Wallet};
use log::debug;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Outbound endpoints toward the network layer.
pub struct NodeIo {
    /// Blocks this node mined
    pub blocks: mpsc::Receiver<Block>,
    /// Transactions this node's wallet emitted
    pub transactions: mpsc::Receiver<Transaction>,
}

pub struct Node {
    pub conf: Config,
    pub id: KeyPair,
    pub chain: Arc<RwLock<Blockchain>>,
    pub miner: Arc<Miner>,
    pub wallet: Option<Arc<Wallet>>,
    mined_rx: Mutex<Option<mpsc::Receiver<Block>>>,
}

impl Node {
    /// Build a node from a configuration, with a fresh identity and a
    /// chain holding the genesis block.
    pub fn new(conf: Config) -> (Arc<Self>, NodeIo) {
        Self::with_identity(conf, KeyPair::generate())
    }

    /// Build a node around an existing identity.
    pub fn with_identity(conf: Config, id: KeyPair) -> (Arc<Self>, NodeIo) {
        let mut chain = Blockchain::new(&conf);
        // Chain log lines carry the node's short identity
        chain.set_address(&id.public_key_hex()[..8]);
        let tip_hash = chain.tip_hash().to_string();
        let length = chain.length() as u32;
        let chain = Arc::new(RwLock::new(chain));

        let (block_out_tx, block_out_rx) = mpsc::channel(1);
        let (tx_out_tx, tx_out_rx) = mpsc::channel(1);
        let (mined_tx, mined_rx) = mpsc::channel(1);

        let miner = Miner::new(
            conf.clone(),
            id.public_key_hex(),
            tip_hash,
            length,
            block_out_tx,
            mined_tx,
        );
        let wallet = Wallet::new(conf.clone(), id.clone(), Arc::clone(&chain), tx_out_tx);

        let node = Arc::new(Self {
            conf,
            id,
            chain,
            miner,
            wallet,
            mined_rx: Mutex::new(Some(mined_rx)),
        });
        (
            node,
            NodeIo {
                blocks: block_out_rx,
                transactions: tx_out_rx,
            },
        )
    }

    /// Spawn the mining loop and the loopback task that routes the miner's
    /// own blocks through the inbound handling path.
    pub fn start(self: &Arc<Self>) {
        self.miner.start();
        let node = Arc::clone(self);
        tokio::spawn(async move {
            let Some(mut rx) = node.mined_rx.lock().await.take() else {
                return;
            };
            while let Some(block) = rx.recv().await {
                node.handle_block(block).await;
            }
        });
    }

    /// Activate the miner and prod it once so an already-primed pool
    /// starts an attempt.
    pub fn start_miner(&self) {
        self.miner.set_active(true);
        self.miner.signal_pool_updated();
    }

    /// Stop the miner. Its current attempt dies on the next signal.
    pub fn stop_miner(&self) {
        self.miner.set_active(false);
        self.miner.signal_pool_updated();
    }

    /// Validate a block against the current chain.
    pub async fn check_block(&self, block: &Block) -> bool {
        let chain = self.chain.read().await;
        validation::check_block(&chain, &self.conf, block)
    }

    /// Validate a transaction against the current chain.
    pub async fn check_transaction(&self, tx: &Transaction) -> bool {
        let chain = self.chain.read().await;
        validation::check_transaction(&chain, &self.conf, tx)
    }

    /// Inbound block path: validate, add to the chain, fan out to the
    /// miner and, once a block reaches safe depth, to the wallet.
    pub async fn handle_block(&self, block: Block) {
        if !self.check_block(&block).await {
            debug!("rejected block {}", &block.hash()[..8]);
            return;
        }
        let (tip_hash, length, safe_block) = {
            let mut chain = self.chain.write().await;
            chain.add(block.clone());
            let length = chain.length();
            let safe_block = length
                .checked_sub(1 + self.conf.safe_block_depth)
                .and_then(|depth| chain.block_at_depth(depth));
            (chain.tip_hash().to_string(), length, safe_block)
        };
        self.miner
            .handle_block(tip_hash, length as u32, &block.transactions)
            .await;
        if let (Some(wallet), Some(safe)) = (&self.wallet, safe_block) {
            wallet.handle_block(&safe).await;
        }
    }

    /// Inbound transaction path: validate, then hand to the miner's pool.
    pub async fn handle_transaction(&self, tx: Transaction) {
        if !self.check_transaction(&tx).await {
            debug!("rejected transaction {}", &tx.hash()[..8]);
            return;
        }
        self.miner.handle_transaction(tx).await;
    }

    /// Ask the wallet to pay someone. A node without a wallet drops the
    /// request.
    pub async fn send_transaction(&self, req: TxRequest) {
        if let Some(wallet) = &self.wallet {
            wallet.handle_transaction_request(req).await;
        }
    }
}
