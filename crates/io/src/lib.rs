//! Binary reader/writer for the dense, bit-exact on-chain wire format.
//!
//! A script's on-chain representation is its byte-serialized method array
//! (opcode byte followed by fixed-layout immediates). `BinaryWriter` and
//! `BinaryReader` are the only place that format is spelled out; every
//! higher layer goes through `Serializable` so that `deserialize(serialize(x))
//! == x` holds structurally, not by convention.

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    #[error("unexpected end of buffer: wanted {wanted} bytes, {available} available")]
    UnexpectedEof { wanted: usize, available: usize },

    #[error("value out of range while decoding {what}")]
    OutOfRange { what: &'static str },
}

pub type Result<T> = std::result::Result<T, IoError>;

/// Implemented by anything with a bit-exact binary wire format.
pub trait Serializable: Sized {
    fn serialize(&self, writer: &mut BinaryWriter);
    fn deserialize(reader: &mut BinaryReader) -> Result<Self>;

    /// Convenience wrapper returning an owned byte buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.serialize(&mut writer);
        writer.into_bytes()
    }

    /// Convenience wrapper parsing a full buffer, erroring on trailing bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let value = Self::deserialize(&mut reader)?;
        Ok(value)
    }
}
