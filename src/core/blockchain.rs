//! Block tree with per-node UTXO snapshots
//!
//! The chain stores every known block, forks included, in a hash-keyed
//! table. Each node carries the UTXO set valid *after* its block has been
//! applied, derived from a clone of its parent's snapshot so sibling forks
//! never share state. The main chain is the deepest node and its ancestors;
//! the first-seen node wins depth ties.

use crate::config::Config;
use crate::core::block::Block;
use crate::core::transaction::{
    outpoint_key, parse_outpoint_key, Transaction, TransactionInput, TransactionOutput,
};
use log::debug;
use std::collections::HashMap;

/// One block's position in the tree: the block itself, the hash key of its
/// parent, the UTXO snapshot after the block, and its depth (genesis = 0).
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub block: Block,
    pub parent: Option<String>,
    pub depth: u64,
    utxo: HashMap<String, TransactionOutput>,
}

/// A UTXO's location and content, enough to build a transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoInfo {
    pub tx_hash: String,
    pub output_index: u32,
    pub output: TransactionOutput,
    pub amount: u32,
}

/// Result of selecting UTXO to cover an amount.
#[derive(Debug, Clone, Default)]
pub struct UtxoSelection {
    pub utxos: Vec<UtxoInfo>,
    pub change: u32,
}

/// The block store: all known blocks keyed by hash, plus the main-chain tip.
#[derive(Debug)]
pub struct Blockchain {
    /// Display identity of the node storing the chain, used in log lines
    pub address: String,
    blocks: HashMap<String, BlockNode>,
    main_tip: String,
}

impl Blockchain {
    /// Construct a chain holding only the genesis block. Its snapshot has a
    /// single entry for the genesis coinbase output.
    pub fn new(conf: &Config) -> Self {
        let genesis = Block::genesis(conf.init_subsidy, &conf.genesis_pub_key);
        let genesis_tx = &genesis.transactions[0];
        let utxo = HashMap::from([(
            outpoint_key(&genesis_tx.hash(), 0),
            genesis_tx.outputs[0].clone(),
        )]);
        let hash = genesis.hash();
        let node = BlockNode {
            block: genesis,
            parent: None,
            depth: 0,
            utxo,
        };
        Self {
            address: String::new(),
            blocks: HashMap::from([(hash.clone(), node)]),
            main_tip: hash,
        }
    }

    /// Set the node's display identity. Intended to be called once by the
    /// embedder.
    pub fn set_address(&mut self, address: &str) {
        self.address = address.to_string();
    }

    fn tip(&self) -> &BlockNode {
        self.blocks
            .get(&self.main_tip)
            .expect("main-chain tip is always present")
    }

    /// Hash of the current main-chain tip
    pub fn tip_hash(&self) -> &str {
        &self.main_tip
    }

    /// Add a block whose parent is already known. The child snapshot is
    /// derived from a clone of the parent snapshot: inputs are consumed,
    /// then outputs inserted, in block order. A block with an unknown
    /// parent is dropped; validation is the caller's responsibility.
    pub fn add(&mut self, block: Block) {
        let Some(parent) = self.blocks.get(&block.header.prev_block_hash) else {
            debug!(
                "{}: dropped block {} with unknown parent",
                self.address,
                &block.hash()[..8]
            );
            return;
        };

        let mut utxo = parent.utxo.clone();
        let depth = parent.depth + 1;
        let parent_hash = block.header.prev_block_hash.clone();

        for tx in &block.transactions {
            for input in &tx.inputs {
                utxo.remove(&input.outpoint());
            }
            let tx_hash = tx.hash();
            for (index, output) in tx.outputs.iter().enumerate() {
                utxo.insert(outpoint_key(&tx_hash, index as u32), output.clone());
            }
        }

        let hash = block.hash();
        let node = BlockNode {
            block,
            parent: Some(parent_hash),
            depth,
            utxo,
        };
        let extends_main = depth > self.tip().depth;
        self.blocks.insert(hash.clone(), node);
        if extends_main {
            self.main_tip = hash.clone();
        }
        debug!("{}: added block {} at depth {}", self.address, &hash[..8], depth);
    }

    /// Number of blocks on the main chain
    pub fn length(&self) -> u64 {
        self.tip().depth + 1
    }

    /// Look up a block by hash, across forks
    pub fn get(&self, hash: &str) -> Option<&Block> {
        self.blocks.get(hash).map(|n| &n.block)
    }

    /// Depth of a block by hash, if known
    pub fn index_of(&self, hash: &str) -> Option<u64> {
        self.blocks.get(hash).map(|n| n.depth)
    }

    /// The last block of the main chain
    pub fn last_block(&self) -> &Block {
        &self.tip().block
    }

    /// Main-chain blocks, genesis first
    pub fn list(&self) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(self.length() as usize);
        let mut node = Some(self.tip());
        while let Some(n) = node {
            blocks.push(n.block.clone());
            node = n.parent.as_ref().and_then(|h| self.blocks.get(h));
        }
        blocks.reverse();
        blocks
    }

    /// Main-chain blocks with depth in `[start, end)`, genesis-first order
    pub fn slice(&self, start: u64, end: u64) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut node = Some(self.tip());
        while let Some(n) = node {
            if n.depth < start {
                break;
            }
            if n.depth < end {
                blocks.push(n.block.clone());
            }
            node = n.parent.as_ref().and_then(|h| self.blocks.get(h));
        }
        blocks.reverse();
        blocks
    }

    /// The main-chain block at the given depth, if any
    pub fn block_at_depth(&self, depth: u64) -> Option<Block> {
        self.slice(depth, depth + 1).into_iter().next()
    }

    /// Whether a block would extend the current main-chain tip
    pub fn is_end_main_chain(&self, block: &Block) -> bool {
        self.main_tip == block.header.prev_block_hash
    }

    /// Look up the output an input references in the main-chain tip snapshot
    pub fn utxo_for_input(&self, input: &TransactionInput) -> Option<&TransactionOutput> {
        self.tip().utxo.get(&input.outpoint())
    }

    /// Whether an input references an output missing from the tip snapshot
    pub fn is_invalid_input(&self, input: &TransactionInput) -> bool {
        self.utxo_for_input(input).is_none()
    }

    /// Check that every input of every transaction references a live UTXO
    /// on the chain ending at `prev_hash` (falling back to the main-chain
    /// tip when the parent is unknown), and that no UTXO is consumed twice
    /// across the batch.
    pub fn inputs_on_chain(&self, txs: &[Transaction], prev_hash: &str) -> bool {
        let node = self.blocks.get(prev_hash).unwrap_or_else(|| self.tip());
        let mut consumed = std::collections::HashSet::new();
        for tx in txs {
            for input in &tx.inputs {
                let key = input.outpoint();
                if !node.utxo.contains_key(&key) || !consumed.insert(key) {
                    return false;
                }
            }
        }
        true
    }

    /// Select UTXO locked to `pub_key` from the tip snapshot until their
    /// total covers `amount`. Returns `None` when the balance is
    /// insufficient; a zero amount selects nothing. Iteration order over
    /// the snapshot is unspecified, so which outputs are picked is too.
    pub fn utxo_for_amount(&self, amount: u32, pub_key: &str) -> Option<UtxoSelection> {
        if amount == 0 {
            return Some(UtxoSelection::default());
        }
        let mut utxos = Vec::new();
        let mut total: u32 = 0;
        for (key, output) in &self.tip().utxo {
            if output.locking_script != pub_key {
                continue;
            }
            let Some((tx_hash, output_index)) = parse_outpoint_key(key) else {
                continue;
            };
            utxos.push(UtxoInfo {
                tx_hash: tx_hash.to_string(),
                output_index,
                output: output.clone(),
                amount: output.amount,
            });
            total = total.saturating_add(output.amount);
            if total >= amount {
                return Some(UtxoSelection {
                    utxos,
                    change: total - amount,
                });
            }
        }
        None
    }

    /// Total of tip-snapshot outputs locked to `pub_key`
    pub fn balance(&self, pub_key: &str) -> u32 {
        self.tip()
            .utxo
            .values()
            .filter(|o| o.locking_script == pub_key)
            .map(|o| o.amount)
            .sum()
    }
}
