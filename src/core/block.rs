//! Blocks and block headers
//!
//! A block is a header plus an ordered list of transactions. The header
//! hash doubles as the proof-of-work statement: it must compare below the
//! difficulty target as a fixed-width hex string.

use crate::core::transaction::Transaction;
use crate::crypto::{double_sha256_hex, merkle_root};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Block header containing metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version
    pub version: u32,
    /// Hash of the previous block; empty for the genesis block
    pub prev_block_hash: String,
    /// Merkle root of all transactions
    pub merkle_root: String,
    /// Block creation time, Unix seconds
    pub timestamp: i64,
    /// Difficulty target as a fixed-width hex string
    pub difficulty_target: String,
    /// Nonce used for proof of work
    pub nonce: u32,
}

impl BlockHeader {
    /// Deterministic hash of the header
    pub fn hash(&self) -> String {
        let data = format!(
            "{}{}{}{}{}{}",
            self.version,
            self.prev_block_hash,
            self.merkle_root,
            self.timestamp,
            self.difficulty_target,
            self.nonce
        );
        double_sha256_hex(data.as_bytes())
    }
}

/// A block in the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a new unmined block on top of `prev_block_hash`.
    pub fn new(prev_block_hash: String, transactions: Vec<Transaction>, difficulty_target: String) -> Self {
        let tx_hashes: Vec<String> = transactions.iter().map(|t| t.hash()).collect();
        let header = BlockHeader {
            version: 0,
            prev_block_hash,
            merkle_root: merkle_root(&tx_hashes),
            timestamp: Utc::now().timestamp(),
            difficulty_target,
            nonce: 0,
        };
        Self {
            header,
            transactions,
        }
    }

    /// The genesis block: fixed header fields and a single coinbase paying
    /// the configured subsidy to the genesis public key.
    pub fn genesis(init_subsidy: u32, genesis_pub_key: &str) -> Self {
        use crate::core::transaction::TransactionOutput;

        let coinbase = Transaction::new(
            0,
            vec![],
            vec![TransactionOutput::new(init_subsidy, genesis_pub_key)],
            0,
        );
        Self {
            header: BlockHeader {
                version: 0,
                prev_block_hash: String::new(),
                merkle_root: String::new(),
                timestamp: 0,
                difficulty_target: String::new(),
                nonce: 0,
            },
            transactions: vec![coinbase],
        }
    }

    /// Hash of this block (its header hash)
    pub fn hash(&self) -> String {
        self.header.hash()
    }

    /// Proof-of-work predicate: the header hash must be lexicographically
    /// smaller than the target.
    pub fn satisfies_pow(&self, target: &str) -> bool {
        self.hash().as_str() < target
    }

    /// Estimated byte size of the block
    pub fn size(&self) -> u32 {
        let header = (16
            + self.header.prev_block_hash.len()
            + self.header.merkle_root.len()
            + self.header.difficulty_target.len()) as u32;
        header + self.transactions.iter().map(|t| t.size()).sum::<u32>()
    }
}
