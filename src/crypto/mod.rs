//! Cryptographic utilities for the node core
//!
//! This module provides:
//! - SHA-256 hashing and hex digests
//! - Difficulty-target helpers for proof of work
//! - secp256k1 key pairs for node identity

pub mod hash;
pub mod keys;

pub use hash::{difficulty_target, double_sha256, double_sha256_hex, merkle_root, sha256, sha256_hex};
pub use keys::{KeyError, KeyPair};
