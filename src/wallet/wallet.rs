//! Wallet: transaction assembly and resend policy
//!
//! The wallet turns transaction requests into transactions by selecting
//! its own UTXO from the chain, publishes them to the node, and keeps them
//! in the liminal queue until a safe-depth block confirms them. Stale
//! liminal transactions are resent with a bumped lock time so they hash
//! differently.

use crate::config::Config;
use crate::core::block::Block;
use crate::core::blockchain::Blockchain;
use crate::core::transaction::{Transaction, TransactionInput, TransactionOutput};
use crate::crypto::KeyPair;
use crate::wallet::liminal::LiminalTxs;
use log::debug;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("insufficient funds to cover {amount} plus fee {fee}")]
    InsufficientFunds { amount: u32, fee: u32 },
}

/// The minimum information needed to request a payment: whom to pay, how
/// much, and the fee offered to the miner.
#[derive(Debug, Clone)]
pub struct TxRequest {
    /// Serialized public key of the payee
    pub pub_key: Vec<u8>,
    pub amount: u32,
    pub fee: u32,
}

pub struct Wallet {
    conf: Config,
    id: KeyPair,
    chain: Arc<RwLock<Blockchain>>,
    liminal: Mutex<LiminalTxs>,
    /// Outbound channel to the node; sends block until consumed
    send_tx: mpsc::Sender<Transaction>,
}

impl Wallet {
    /// Create a wallet, or `None` when the configuration disables one.
    pub fn new(
        conf: Config,
        id: KeyPair,
        chain: Arc<RwLock<Blockchain>>,
        send_tx: mpsc::Sender<Transaction>,
    ) -> Option<Arc<Self>> {
        if !conf.has_wallet {
            return None;
        }
        Some(Arc::new(Self {
            liminal: Mutex::new(LiminalTxs::new(&conf)),
            conf,
            id,
            chain,
            send_tx,
        }))
    }

    /// The wallet's own public key, hex encoded. Outputs locked to this
    /// key are the wallet's funds.
    pub fn public_key_hex(&self) -> String {
        self.id.public_key_hex()
    }

    /// Number of transactions awaiting confirmation
    pub async fn pending(&self) -> usize {
        self.liminal.lock().await.len()
    }

    /// Fulfill a transaction request: select enough of the wallet's UTXO
    /// to cover amount plus fee, assemble the transaction, queue it as
    /// liminal, and publish it. Requests the wallet cannot fund are
    /// dropped.
    pub async fn handle_transaction_request(&self, req: TxRequest) {
        if req.amount == 0 {
            return;
        }
        let tx = match self.assemble(&req).await {
            Ok(tx) => tx,
            Err(e) => {
                debug!("dropped transaction request: {}", e);
                return;
            }
        };
        self.liminal.lock().await.add(tx.clone());
        let _ = self.send_tx.send(tx).await;
    }

    async fn assemble(&self, req: &TxRequest) -> Result<Transaction, WalletError> {
        let own_pk = self.public_key_hex();
        let needed = req.amount.saturating_add(req.fee);
        let selection = self
            .chain
            .read()
            .await
            .utxo_for_amount(needed, &own_pk)
            .ok_or(WalletError::InsufficientFunds {
                amount: req.amount,
                fee: req.fee,
            })?;

        let inputs = selection
            .utxos
            .iter()
            .map(|u| TransactionInput::new(&u.tx_hash, u.output_index, &own_pk, u.amount))
            .collect();
        let mut outputs = vec![TransactionOutput::new(
            req.amount,
            &hex::encode(&req.pub_key),
        )];
        if selection.change > 0 {
            outputs.push(TransactionOutput::new(selection.change, &own_pk));
        }
        Ok(Transaction::new(
            self.conf.tx_version,
            inputs,
            outputs,
            self.conf.default_lock_time,
        ))
    }

    /// Absorb a block that reached safe depth on the main chain: confirm
    /// liminal duplicates, age the rest, and resend anything stale with an
    /// incremented lock time (giving it a fresh hash).
    pub async fn handle_block(&self, block: &Block) {
        let (stale, confirmed) = self.liminal.lock().await.check(&block.transactions);
        if !confirmed.is_empty() {
            debug!("{} wallet transaction(s) confirmed at safe depth", confirmed.len());
        }
        for mut tx in stale {
            tx.lock_time = tx.lock_time.wrapping_add(1);
            debug!("resending stale transaction {}", &tx.hash()[..8]);
            self.liminal.lock().await.add(tx.clone());
            let _ = self.send_tx.send(tx).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn funded_wallet(
        tx_replay_thresh: u32,
    ) -> (Arc<Wallet>, Arc<RwLock<Blockchain>>, mpsc::Receiver<Transaction>) {
        let id = KeyPair::generate();
        let conf = Config {
            init_subsidy: 50,
            genesis_pub_key: id.public_key_hex(),
            tx_replay_thresh,
            ..Config::default()
        };
        let chain = Arc::new(RwLock::new(Blockchain::new(&conf)));
        let (send_tx, recv_tx) = mpsc::channel(1);
        let wallet = Wallet::new(conf, id, Arc::clone(&chain), send_tx).unwrap();
        (wallet, chain, recv_tx)
    }

    fn recipient() -> Vec<u8> {
        KeyPair::generate().public_key.serialize().to_vec()
    }

    #[test]
    fn test_wallet_disabled_by_config() {
        let conf = Config {
            has_wallet: false,
            ..Config::default()
        };
        let chain = Arc::new(RwLock::new(Blockchain::new(&conf)));
        let (send_tx, _recv) = mpsc::channel(1);
        assert!(Wallet::new(conf, KeyPair::generate(), chain, send_tx).is_none());
    }

    #[tokio::test]
    async fn test_request_builds_transaction_with_change() {
        let (wallet, _chain, mut recv) = funded_wallet(10);
        let payee = recipient();
        wallet
            .handle_transaction_request(TxRequest {
                pub_key: payee.clone(),
                amount: 10,
                fee: 5,
            })
            .await;

        let tx = recv.recv().await.unwrap();
        assert_eq!(tx.sum_inputs(), 50);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].amount, 10);
        assert_eq!(tx.outputs[0].locking_script, hex::encode(&payee));
        // Change covers everything but amount and fee
        assert_eq!(tx.outputs[1].amount, 35);
        assert_eq!(tx.outputs[1].locking_script, wallet.public_key_hex());
        assert_eq!(wallet.pending().await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_funds_dropped_silently() {
        let (wallet, _chain, mut recv) = funded_wallet(10);
        wallet
            .handle_transaction_request(TxRequest {
                pub_key: recipient(),
                amount: 1000,
                fee: 0,
            })
            .await;
        wallet
            .handle_transaction_request(TxRequest {
                pub_key: recipient(),
                amount: 0,
                fee: 0,
            })
            .await;

        let outcome = tokio::time::timeout(Duration::from_millis(100), recv.recv()).await;
        assert!(outcome.is_err(), "no transaction should be published");
        assert_eq!(wallet.pending().await, 0);
    }

    #[tokio::test]
    async fn test_stale_transaction_resent_with_bumped_lock_time() {
        let (wallet, _chain, mut recv) = funded_wallet(2);
        wallet
            .handle_transaction_request(TxRequest {
                pub_key: recipient(),
                amount: 10,
                fee: 5,
            })
            .await;
        let original = recv.recv().await.unwrap();

        // Three safe-depth blocks arrive, none confirming the transaction
        let unrelated = Block::genesis(25, "other");
        wallet.handle_block(&unrelated).await;
        wallet.handle_block(&unrelated).await;
        assert_eq!(wallet.pending().await, 1);
        wallet.handle_block(&unrelated).await;

        let resent = recv.recv().await.unwrap();
        assert_eq!(resent.lock_time, original.lock_time + 1);
        assert_ne!(resent.hash(), original.hash());
        assert_eq!(resent.inputs, original.inputs);
        assert_eq!(wallet.pending().await, 1);
    }

    #[tokio::test]
    async fn test_confirmed_transaction_leaves_the_queue() {
        let (wallet, _chain, mut recv) = funded_wallet(1);
        wallet
            .handle_transaction_request(TxRequest {
                pub_key: recipient(),
                amount: 10,
                fee: 5,
            })
            .await;
        let tx = recv.recv().await.unwrap();

        let confirming = Block::new("prev".to_string(), vec![tx], String::new());
        wallet.handle_block(&confirming).await;
        assert_eq!(wallet.pending().await, 0);

        // Aging past the threshold afterwards resends nothing
        let unrelated = Block::genesis(25, "other");
        wallet.handle_block(&unrelated).await;
        wallet.handle_block(&unrelated).await;
        let outcome = tokio::time::timeout(Duration::from_millis(100), recv.recv()).await;
        assert!(outcome.is_err());
    }
}
