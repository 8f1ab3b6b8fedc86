//! Address / lockup-script handle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::ADDRESS_BYTES;
use crate::error::ArithmeticError;

/// An opaque spend condition attached to an output.
///
/// The VM treats a lockup script only as an address value: it never
/// interprets the bytes, only compares and hashes them. Block/header
/// validation and P2P layers own the actual lockup-script semantics.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const fn zero() -> Self {
        Address([0u8; ADDRESS_BYTES])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArithmeticError> {
        if bytes.len() != ADDRESS_BYTES {
            return Err(ArithmeticError::OutOfRange);
        }
        let mut buf = [0u8; ADDRESS_BYTES];
        buf.copy_from_slice(bytes);
        Ok(Address(buf))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(Address::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn round_trips_bytes() {
        let bytes = [7u8; ADDRESS_BYTES];
        let addr = Address::from_bytes(&bytes).unwrap();
        assert_eq!(addr.as_bytes(), &bytes);
    }
}
