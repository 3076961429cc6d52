//! Core chain components
//!
//! The fundamental building blocks of the node:
//! - Transactions (UTXO model, outpoint keys)
//! - Blocks (headers, proof of work)
//! - The block tree with per-node UTXO snapshots
//! - The shared max-priority transaction queue

pub mod block;
pub mod blockchain;
pub mod transaction;
pub mod tx_heap;

pub use block::{Block, BlockHeader};
pub use blockchain::{BlockNode, Blockchain, UtxoInfo, UtxoSelection};
pub use transaction::{
    outpoint_key, parse_outpoint_key, Transaction, TransactionInput, TransactionOutput,
};
pub use tx_heap::TxHeap;
