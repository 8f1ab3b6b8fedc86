//! Cryptographic primitives used by the VM's crypto instructions and by the
//! state-pruning utility.
//!
//! This crate provides exactly what the rest of the toolchain calls:
//! Blake2b-256 and Keccak-256 hashing, secp256k1 signature verification and
//! Ethereum-style public-key recovery, and a bloom filter for the pruner.

pub mod bloom_filter;
pub mod ecrecover;
pub mod hash;

pub use bloom_filter::BloomFilter;
pub use ecrecover::{eth_ecrecover, verify_secp256k1};
pub use hash::{blake2b_256, keccak256};

/// Error type for cryptography operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
