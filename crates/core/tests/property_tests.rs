//! Property-based tests for alephium-core.
//!
//! Roundtrip: for every 256-bit value, `from_big_endian(to_big_endian_fixed(x)) == x`
//! (and the signed analogue for `I256`).

use alephium_core::{I256, U256};
use proptest::prelude::*;

proptest! {
    #[test]
    fn u256_big_endian_roundtrips_every_32_byte_pattern(bytes in any::<[u8; 32]>()) {
        let value = U256::from_big_endian(&bytes).unwrap();
        prop_assert_eq!(value.to_big_endian_fixed(), bytes);
    }

    #[test]
    fn u256_from_u64_roundtrips_every_value(v in any::<u64>()) {
        let value = U256::from_u64(v);
        let bytes = value.to_big_endian_fixed();
        prop_assert_eq!(U256::from_big_endian(&bytes).unwrap(), value);
    }

    #[test]
    fn i256_be_bytes_roundtrip_every_value(v in any::<i64>()) {
        let value = I256::from_i64(v);
        let bytes = value.to_be_bytes_fixed();
        prop_assert_eq!(I256::from_be_bytes_fixed(&bytes).unwrap(), value);
    }

    #[test]
    fn u256_serialization_is_deterministic(bytes in any::<[u8; 32]>()) {
        let value = U256::from_big_endian(&bytes).unwrap();
        prop_assert_eq!(value.to_big_endian_fixed(), value.to_big_endian_fixed());
    }
}
