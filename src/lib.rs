//! BrunoCoin: a pedagogical UTXO-model cryptocurrency node core
//!
//! This crate provides the on-node state machinery of a small
//! proof-of-work cryptocurrency:
//! - A block tree with a designated main chain and per-node UTXO snapshots
//! - A priority-ranked transaction pool and a cancellable mining loop
//! - Block and transaction acceptance rules
//! - A wallet with a liminal (unconfirmed) transaction queue and resend policy
//!
//! Networking, persistence, and signature semantics live outside the core;
//! the node publishes blocks and transactions on outbound channels and
//! consumes inbound blocks and transactions through [`node::Node`].
//!
//! # Example
//!
//! ```no_run
//! use brunocoin::config::Config;
//! use brunocoin::node::Node;
//!
//! # async fn run() {
//! let (node, mut io) = Node::new(Config::default());
//! node.start();
//! node.start_miner();
//!
//! // Blocks the miner publishes appear on the outbound channel.
//! while let Some(block) = io.blocks.recv().await {
//!     println!("mined {}", block.hash());
//! }
//! # }
//! ```

pub mod config;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod node;
pub mod validation;
pub mod wallet;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::core::{
    Block, BlockHeader, Blockchain, Transaction, TransactionInput, TransactionOutput,
};
pub use crate::crypto::KeyPair;
pub use crate::mining::{Miner, TxPool};
pub use crate::node::{Node, NodeIo};
pub use crate::wallet::{TxRequest, Wallet};
