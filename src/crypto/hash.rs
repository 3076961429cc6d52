//! Hashing utilities for the node core
//!
//! SHA-256 based digests for block headers and transaction ids, plus the
//! fixed-width hex difficulty targets that proof of work compares against.

use sha2::{Digest, Sha256};

/// Width of a hex-encoded SHA-256 digest. Difficulty targets share it so
/// that `hash < target` is a plain lexicographic comparison.
pub const DIGEST_HEX_WIDTH: usize = 64;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes double SHA-256 hash and returns it as a hex string
pub fn double_sha256_hex(data: &[u8]) -> String {
    hex::encode(double_sha256(data))
}

/// Builds a difficulty target with the given number of leading zero hex
/// digits. A header hash satisfies the target iff it is lexicographically
/// smaller at [`DIGEST_HEX_WIDTH`].
pub fn difficulty_target(leading_zeros: usize) -> String {
    let zeros = leading_zeros.min(DIGEST_HEX_WIDTH);
    let mut target = "0".repeat(zeros);
    target.push_str(&"f".repeat(DIGEST_HEX_WIDTH - zeros));
    target
}

/// Folds a list of hex transaction hashes into a merkle root.
///
/// Odd levels duplicate their last entry. An empty list yields the empty
/// string, which is what the genesis header carries.
pub fn merkle_root(tx_hashes: &[String]) -> String {
    if tx_hashes.is_empty() {
        return String::new();
    }
    let mut level: Vec<String> = tx_hashes.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len() / 2 + 1);
        for pair in level.chunks(2) {
            let right = pair.get(1).unwrap_or(&pair[0]);
            next.push(double_sha256_hex(format!("{}{}", pair[0], right).as_bytes()));
        }
        level = next;
    }
    level.remove(0)
}
