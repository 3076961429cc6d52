//! Node identity keys
//!
//! Every miner and wallet is identified by a secp256k1 public key. Its
//! compressed hex form is what the rest of the core trades in: it locks
//! outputs payable to the node, it is the opaque unlocking script the
//! wallet attaches to inputs, and the coinbase pays out to it. Signing
//! semantics live outside the core, so a key pair here is an identity,
//! not a signer.

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
}

/// A node identity: a secret key and the public key derived from it.
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Fresh identity with a random secret.
    pub fn generate() -> Self {
        Self::from_secret_key(SecretKey::new(&mut OsRng))
    }

    /// Identity derived from a known secret.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key(&Secp256k1::new());
        Self {
            secret_key,
            public_key,
        }
    }

    /// Restore an identity from a hex-encoded secret, e.g. one the
    /// embedder persisted between runs.
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// The compressed public key as hex: the form used as a locking
    /// script on outputs payable to this identity.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }
}
