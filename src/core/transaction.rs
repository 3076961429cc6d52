//! Transactions for the UTXO model
//!
//! A transaction spends prior outputs by naming them as inputs and creates
//! new outputs locked to public keys. A coinbase is any transaction with an
//! empty input set; it mints new currency for the miner.

use crate::crypto::sha256_hex;
use serde::{Deserialize, Serialize};

/// Builds the canonical key for an output's location on the chain:
/// `"{tx-hash}-{index}"` (decimal index, no padding). Every UTXO map in the
/// core is keyed by this string.
pub fn outpoint_key(tx_hash: &str, index: u32) -> String {
    format!("{}-{}", tx_hash, index)
}

/// Splits an outpoint key back into its transaction hash and output index.
pub fn parse_outpoint_key(key: &str) -> Option<(&str, u32)> {
    let (tx_hash, index) = key.rsplit_once('-')?;
    Some((tx_hash, index.parse().ok()?))
}

/// Transaction input referencing a prior output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionInput {
    /// Hash of the transaction that produced the referenced output
    pub transaction_hash: String,
    /// Index of the output within that transaction
    pub output_index: u32,
    /// Script that unlocks the referenced output
    pub unlocking_script: String,
    /// Amount carried by the referenced output
    pub amount: u32,
}

impl TransactionInput {
    pub fn new(transaction_hash: &str, output_index: u32, unlocking_script: &str, amount: u32) -> Self {
        Self {
            transaction_hash: transaction_hash.to_string(),
            output_index,
            unlocking_script: unlocking_script.to_string(),
            amount,
        }
    }

    /// The outpoint key of the output this input consumes.
    pub fn outpoint(&self) -> String {
        outpoint_key(&self.transaction_hash, self.output_index)
    }
}

/// Transaction output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Amount of coins
    pub amount: u32,
    /// Locking script, typically a hex-encoded public key
    pub locking_script: String,
    /// Whether the output belongs to a not-yet-confirmed wallet transaction
    #[serde(default)]
    pub liminal: bool,
}

impl TransactionOutput {
    pub fn new(amount: u32, locking_script: &str) -> Self {
        Self {
            amount,
            locking_script: locking_script.to_string(),
            liminal: false,
        }
    }

    /// Whether the given script unlocks this output. The core treats
    /// unlocking as an opaque public-key match.
    pub fn is_unlocked(&self, unlocking_script: &str) -> bool {
        self.locking_script == unlocking_script
    }
}

/// A transaction: ordered inputs, ordered outputs, and a lock time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(
        version: u32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u32,
    ) -> Self {
        Self {
            version,
            inputs,
            outputs,
            lock_time,
        }
    }

    /// Deterministic hash over the full transaction content. Changing any
    /// field, including the lock time, changes the hash.
    pub fn hash(&self) -> String {
        let mut data = format!("{}:{}", self.version, self.lock_time);
        for input in &self.inputs {
            data.push_str(&format!(
                "|i{}-{}-{}-{}",
                input.transaction_hash, input.output_index, input.unlocking_script, input.amount
            ));
        }
        for output in &self.outputs {
            data.push_str(&format!(
                "|o{}-{}-{}",
                output.amount, output.locking_script, output.liminal
            ));
        }
        sha256_hex(data.as_bytes())
    }

    /// A transaction is a coinbase iff it has no inputs.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Sum of the input amount hints
    pub fn sum_inputs(&self) -> u32 {
        self.inputs.iter().map(|i| i.amount).sum()
    }

    /// Sum of the output amounts
    pub fn sum_outputs(&self) -> u32 {
        self.outputs.iter().map(|o| o.amount).sum()
    }

    /// Estimated byte size, used for block packing and priority ranking
    pub fn size(&self) -> u32 {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| i.transaction_hash.len() + i.unlocking_script.len() + 8)
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| o.locking_script.len() + 5)
            .sum();
        (8 + inputs + outputs) as u32
    }
}
