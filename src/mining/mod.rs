//! Mining: transaction pooling, coinbase synthesis, and the PoW loop

pub mod miner;
pub mod tx_pool;

pub use miner::Miner;
pub use tx_pool::{calc_priority, TxPool, COINBASE_SIZE_RESERVE};
