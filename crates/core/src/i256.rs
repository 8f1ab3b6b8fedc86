//! Fixed-precision 256-bit signed integer.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::error::ArithmeticError;

/// A 256-bit two's-complement-range signed integer, representable range
/// `[-2^255, 2^255 - 1]`, with checked arithmetic.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct I256(BigInt);

impl I256 {
    pub fn zero() -> Self {
        I256(BigInt::zero())
    }

    pub fn min_value() -> Self {
        I256(-(BigInt::from(1) << 255))
    }

    pub fn max_value() -> Self {
        I256((BigInt::from(1) << 255) - BigInt::from(1))
    }

    pub fn from_i64(v: i64) -> Self {
        I256(BigInt::from(v))
    }

    fn from_bigint(v: BigInt) -> Result<Self, ArithmeticError> {
        if v < Self::min_value().0 || v > Self::max_value().0 {
            Err(ArithmeticError::OutOfRange)
        } else {
            Ok(I256(v))
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        Self::from_bigint(&self.0 + &rhs.0).map_err(|_| ArithmeticError::Overflow)
    }

    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        Self::from_bigint(&self.0 - &rhs.0).map_err(|_| ArithmeticError::Underflow)
    }

    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        Self::from_bigint(&self.0 * &rhs.0).map_err(|_| ArithmeticError::Overflow)
    }

    pub fn checked_div(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if rhs.0.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Self::from_bigint(&self.0 / &rhs.0).map_err(|_| ArithmeticError::Overflow)
    }

    pub fn checked_rem(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if rhs.0.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Self::from_bigint(&self.0 % &rhs.0).map_err(|_| ArithmeticError::Overflow)
    }

    pub fn checked_neg(&self) -> Result<Self, ArithmeticError> {
        Self::from_bigint(-&self.0).map_err(|_| ArithmeticError::Overflow)
    }

    pub fn abs(&self) -> Self {
        I256(self.0.abs())
    }

    /// Encodes as 32-byte big-endian two's complement, the wire format used
    /// by contract field and instruction-immediate serialization.
    pub fn to_be_bytes_fixed(&self) -> [u8; 32] {
        let magnitude = self.0.to_signed_bytes_be();
        let fill = if self.0.sign() == num_bigint::Sign::Minus {
            0xFFu8
        } else {
            0x00u8
        };
        let mut out = [fill; 32];
        let start = 32 - magnitude.len();
        out[start..].copy_from_slice(&magnitude);
        out
    }

    pub fn from_be_bytes_fixed(bytes: &[u8; 32]) -> Result<Self, ArithmeticError> {
        Self::from_bigint(BigInt::from_signed_bytes_be(bytes))
    }
}

impl fmt::Debug for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I256({})", self.0)
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for I256 {
    fn from(v: i64) -> Self {
        Self::from_i64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neg_of_min_overflows() {
        assert_eq!(I256::min_value().checked_neg(), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn add_at_bounds() {
        assert_eq!(
            I256::max_value().checked_add(&I256::from_i64(1)),
            Err(ArithmeticError::Overflow)
        );
        assert_eq!(
            I256::min_value().checked_sub(&I256::from_i64(1)),
            Err(ArithmeticError::Underflow)
        );
    }

    #[test]
    fn div_by_zero_is_arithmetic_error() {
        assert_eq!(
            I256::from_i64(4).checked_div(&I256::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn fixed_bytes_round_trip_negative_and_positive() {
        for v in [I256::from_i64(-42), I256::from_i64(42), I256::zero(), I256::min_value(), I256::max_value()] {
            let bytes = v.to_be_bytes_fixed();
            assert_eq!(I256::from_be_bytes_fixed(&bytes).unwrap(), v);
        }
    }
}
