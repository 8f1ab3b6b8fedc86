//! Hash functions used by the VM's `Blake2b` and `Keccak256` instructions.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use sha3::Keccak256;

type Blake2b256 = Blake2b<U32>;

/// Computes the Blake2b hash of `data`, truncated to 256 bits.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the Keccak-256 hash of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_of_empty_is_stable() {
        let h1 = blake2b_256(b"");
        let h2 = blake2b_256(b"");
        assert_eq!(h1, h2);
    }

    #[test]
    fn keccak_differs_from_blake2b() {
        assert_ne!(blake2b_256(b"alephium"), keccak256(b"alephium"));
    }
}
