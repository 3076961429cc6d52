//! Node configuration
//!
//! One flat set of options shared by the chain, the miner, and the wallet.

use crate::crypto::difficulty_target;
use serde::{Deserialize, Serialize};

/// Configuration for a node's core components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Block version stamped on mined blocks
    pub version: u32,
    /// Transaction version stamped on wallet transactions
    pub tx_version: u32,
    /// Initial block subsidy, before any halvings
    pub init_subsidy: u32,
    /// Blocks per subsidy halving
    pub subsidy_halving_rate: u32,
    /// Cap on the number of halvings
    pub max_halvings: u32,
    /// Public key (hex) that receives the genesis output
    pub genesis_pub_key: String,
    /// Static proof-of-work difficulty target, as a fixed-width hex string
    pub pow_difficulty: String,
    /// Upper bound of the nonce search
    pub nonce_limit: u32,
    /// Size budget when packing transactions into a block for mining
    pub block_pack_size: u32,
    /// Hard cap on block (and transaction) size during validation
    pub max_block_size: u32,
    /// Cumulative pool priority needed before mining starts
    pub priority_threshold: u32,
    /// Maximum number of transactions held in the pool
    pub tx_pool_cap: u32,
    /// Lock-time stamped on wallet transactions
    pub default_lock_time: u32,
    /// Age priority past which a liminal transaction is resent
    pub tx_replay_thresh: u32,
    /// Confirmations before a main-chain block is reported to the wallet
    pub safe_block_depth: u64,
    /// Whether this node runs a wallet
    pub has_wallet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 0,
            tx_version: 0,
            init_subsidy: 100,
            subsidy_halving_rate: 10_000,
            max_halvings: 10,
            genesis_pub_key: String::new(),
            pow_difficulty: difficulty_target(4),
            nonce_limit: u32::MAX,
            block_pack_size: 1_000,
            max_block_size: 10_000,
            priority_threshold: 10,
            tx_pool_cap: 50,
            default_lock_time: 0,
            tx_replay_thresh: 10,
            safe_block_depth: 6,
            has_wallet: true,
        }
    }
}
