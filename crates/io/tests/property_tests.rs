//! Property-based tests for alephium-io.
//!
//! Roundtrip: for every primitive the wire format defines,
//! `read(write(x)) == x`, regardless of how many other fields surround it.

use alephium_io::{BinaryReader, BinaryWriter};
use proptest::prelude::*;

proptest! {
    #[test]
    fn u8_roundtrips(v in any::<u8>()) {
        let mut w = BinaryWriter::new();
        w.write_u8(v);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_u8().unwrap(), v);
    }

    #[test]
    fn u16_roundtrips(v in any::<u16>()) {
        let mut w = BinaryWriter::new();
        w.write_u16(v);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_u16().unwrap(), v);
    }

    #[test]
    fn u32_roundtrips(v in any::<u32>()) {
        let mut w = BinaryWriter::new();
        w.write_u32(v);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_u32().unwrap(), v);
    }

    #[test]
    fn u64_roundtrips(v in any::<u64>()) {
        let mut w = BinaryWriter::new();
        w.write_u64(v);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_u64().unwrap(), v);
    }

    #[test]
    fn i64_roundtrips(v in any::<i64>()) {
        let mut w = BinaryWriter::new();
        w.write_i64(v);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_i64().unwrap(), v);
    }

    #[test]
    fn varuint_roundtrips(v in any::<u64>()) {
        let mut w = BinaryWriter::new();
        w.write_varuint(v);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_varuint().unwrap(), v);
    }

    #[test]
    fn length_prefixed_bytes_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut w = BinaryWriter::new();
        w.write_bytes(&bytes);
        let mut r = BinaryReader::new(&w.into_bytes());
        prop_assert_eq!(r.read_bytes().unwrap(), bytes);
    }

    #[test]
    fn consecutive_fields_roundtrip_in_order(a in any::<u32>(), b in any::<i8>(), bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut w = BinaryWriter::new();
        w.write_u32(a);
        w.write_i8(b);
        w.write_bytes(&bytes);
        let encoded = w.into_bytes();
        let mut r = BinaryReader::new(&encoded);
        prop_assert_eq!(r.read_u32().unwrap(), a);
        prop_assert_eq!(r.read_i8().unwrap(), b);
        prop_assert_eq!(r.read_bytes().unwrap(), bytes);
        prop_assert!(r.is_empty());
    }
}
