//! secp256k1 signature verification and Ethereum-style public-key recovery.
//!
//! Backs the VM's `VerifyTxSignature` and `EthEcRecover` instructions.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use secp256k1::{Message, PublicKey, Secp256k1};

use crate::hash::keccak256;
use crate::{Error, Result};

/// Verifies a non-recoverable ECDSA signature over `message_hash` against
/// `public_key`. Used by `VerifyTxSignature`.
pub fn verify_secp256k1(message_hash: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool> {
    if message_hash.len() != 32 {
        return Err(Error::InvalidLength {
            expected: 32,
            got: message_hash.len(),
        });
    }

    let secp = Secp256k1::verification_only();
    let message =
        Message::from_digest_slice(message_hash).map_err(|_| Error::InvalidSignature)?;
    let sig = Signature::from_compact(signature).map_err(|_| Error::InvalidSignature)?;
    let pubkey = PublicKey::from_slice(public_key).map_err(|_| Error::InvalidSignature)?;

    Ok(secp.verify_ecdsa(&message, &sig, &pubkey).is_ok())
}

/// Recovers the 20-byte Ethereum-style address that signed `message_hash`
/// with `signature` (64 bytes r||s) and `recovery_id` (0-3). Backs the VM's
/// `EthEcRecover` instruction.
pub fn eth_ecrecover(
    message_hash: &[u8],
    signature: &[u8],
    recovery_id: u8,
) -> Result<[u8; 20]> {
    if message_hash.len() != 32 {
        return Err(Error::InvalidLength {
            expected: 32,
            got: message_hash.len(),
        });
    }
    if signature.len() != 64 {
        return Err(Error::InvalidLength {
            expected: 64,
            got: signature.len(),
        });
    }
    if recovery_id > 3 {
        return Err(Error::InvalidRecoveryId(recovery_id));
    }

    let secp = Secp256k1::verification_only();
    let message =
        Message::from_digest_slice(message_hash).map_err(|_| Error::InvalidSignature)?;
    let id = RecoveryId::from_i32(recovery_id as i32).map_err(|_| Error::InvalidRecoveryId(recovery_id))?;
    let recoverable = RecoverableSignature::from_compact(signature, id)
        .map_err(|_| Error::InvalidSignature)?;

    let pubkey = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|_| Error::RecoveryFailed)?;

    // Ethereum address = last 20 bytes of keccak256(uncompressed pubkey without prefix).
    let uncompressed = pubkey.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}
