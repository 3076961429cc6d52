//! Wallet: UTXO selection, liminal queue, and resend policy

pub mod liminal;
pub mod wallet;

pub use liminal::LiminalTxs;
pub use wallet::{TxRequest, Wallet, WalletError};
