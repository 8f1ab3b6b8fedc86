//! Fixed-precision 256-bit unsigned integer.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::ArithmeticError;

/// A 256-bit unsigned integer with checked arithmetic.
///
/// Internally backed by [`BigUint`] rather than a fixed `[u64; 4]` limb
/// array — this crate favours clarity over raw throughput, and every public
/// constructor enforces the 256-bit bound so the invariant never leaks.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct U256(BigUint);

impl Default for U256 {
    fn default() -> Self {
        Self::zero()
    }
}

impl U256 {
    /// The value zero.
    pub fn zero() -> Self {
        U256(BigUint::zero())
    }

    /// The value one.
    pub fn one() -> Self {
        U256(BigUint::one())
    }

    /// The largest representable value, `2^256 - 1`.
    pub fn max_value() -> Self {
        U256((BigUint::one() << 256) - BigUint::one())
    }

    /// Builds a `U256` from a `u64`, which always fits.
    pub fn from_u64(v: u64) -> Self {
        U256(BigUint::from(v))
    }

    /// Builds a `U256` from big-endian bytes. Fails if longer than 32 bytes
    /// with any significant bit set beyond the width.
    pub fn from_big_endian(bytes: &[u8]) -> Result<Self, ArithmeticError> {
        let v = BigUint::from_bytes_be(bytes);
        Self::from_biguint(v)
    }

    fn from_biguint(v: BigUint) -> Result<Self, ArithmeticError> {
        if v.bits() > 256 {
            Err(ArithmeticError::OutOfRange)
        } else {
            Ok(U256(v))
        }
    }

    /// Serializes to a fixed 32-byte big-endian buffer.
    pub fn to_big_endian_fixed(&self) -> [u8; 32] {
        let bytes = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition. `ArithmeticError::Overflow` beyond `2^256 - 1`.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        Self::from_biguint(&self.0 + &rhs.0).map_err(|_| ArithmeticError::Overflow)
    }

    /// Checked subtraction. `ArithmeticError::Underflow` below zero.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if self.0 < rhs.0 {
            Err(ArithmeticError::Underflow)
        } else {
            Ok(U256(&self.0 - &rhs.0))
        }
    }

    /// Checked multiplication. `ArithmeticError::Overflow` beyond `2^256 - 1`.
    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        Self::from_biguint(&self.0 * &rhs.0).map_err(|_| ArithmeticError::Overflow)
    }

    /// Checked division. `ArithmeticError::DivisionByZero` for a zero divisor.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if rhs.0.is_zero() {
            Err(ArithmeticError::DivisionByZero)
        } else {
            Ok(U256(&self.0 / &rhs.0))
        }
    }

    /// Checked modulo. `ArithmeticError::DivisionByZero` for a zero divisor.
    pub fn checked_rem(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if rhs.0.is_zero() {
            Err(ArithmeticError::DivisionByZero)
        } else {
            Ok(U256(&self.0 % &rhs.0))
        }
    }

    pub fn checked_pow(&self, exp: u32) -> Result<Self, ArithmeticError> {
        Self::from_biguint(self.0.pow(exp)).map_err(|_| ArithmeticError::Overflow)
    }

    /// Byte length of the input, used by input-size-dependent gas formulas.
    pub fn byte_len(&self) -> usize {
        self.0.to_bytes_be().len().max(1)
    }

    pub fn to_usize(&self) -> Option<usize> {
        use num_traits::ToPrimitive;
        self.0.to_usize()
    }

    pub fn to_u64(&self) -> Option<u64> {
        use num_traits::ToPrimitive;
        self.0.to_u64()
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({})", self.0)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for U256 {
    type Err = ArithmeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = BigUint::from_str(s).map_err(|_| ArithmeticError::OutOfRange)?;
        Self::from_biguint(v)
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<u32> for U256 {
    fn from(v: u32) -> Self {
        Self::from_u64(v as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_overflows_at_max() {
        let max = U256::max_value();
        assert_eq!(max.checked_add(&U256::one()), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn sub_underflows_below_zero() {
        assert_eq!(
            U256::zero().checked_sub(&U256::one()),
            Err(ArithmeticError::Underflow)
        );
    }

    #[test]
    fn div_by_zero_is_arithmetic_error() {
        assert_eq!(
            U256::from_u64(10).checked_div(&U256::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn round_trip_big_endian() {
        let v = U256::from_u64(0x1234_5678);
        let bytes = v.to_big_endian_fixed();
        assert_eq!(U256::from_big_endian(&bytes).unwrap(), v);
    }

    #[test]
    fn from_big_endian_rejects_oversized_input() {
        let bytes = [1u8; 33];
        assert_eq!(U256::from_big_endian(&bytes), Err(ArithmeticError::OutOfRange));
    }
}
