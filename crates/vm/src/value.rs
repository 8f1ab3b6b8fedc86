//! The tagged value domain and its static types.

use alephium_core::{Address, I256, U256};
use std::sync::Arc;

/// A contract's type identifier, the payload of a `Contract` value and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractId(pub [u8; 32]);

impl ContractId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Static type of a [`Value`]. Arrays may nest; contract types compare by
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Bool,
    U256,
    I256,
    ByteVec,
    Address,
    FixedSizeArray(Box<Type>, usize),
    Contract(ContractId),
}

impl Type {
    /// Number of flattened primitive slots this type occupies once arrays
    /// are lowered to contiguous scalar slots.
    pub fn flattened_len(&self) -> usize {
        match self {
            Type::FixedSizeArray(base, len) => base.flattened_len() * len,
            _ => 1,
        }
    }

    pub fn zero_value(&self) -> Value {
        match self {
            Type::Bool => Value::Bool(false),
            Type::U256 => Value::U256(U256::zero()),
            Type::I256 => Value::I256(I256::zero()),
            Type::ByteVec => Value::ByteVec(Arc::new(Vec::new())),
            Type::Address => Value::Address(Address::zero()),
            Type::Contract(id) => Value::Contract(*id),
            Type::FixedSizeArray(_, _) => {
                unreachable!("arrays are flattened to scalar slots before a zero value is needed")
            }
        }
    }
}

/// A runtime value. Equality is structural; `ByteVec` is reference-counted
/// so copying a value never duplicates its backing bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U256(U256),
    I256(I256),
    ByteVec(Arc<Vec<u8>>),
    Address(Address),
    Contract(ContractId),
}

impl Value {
    pub fn value_type(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::U256(_) => Type::U256,
            Value::I256(_) => Type::I256,
            Value::ByteVec(_) => Type::ByteVec,
            Value::Address(_) => Type::Address,
            Value::Contract(id) => Type::Contract(*id),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<&U256> {
        match self {
            Value::U256(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i256(&self) -> Option<&I256> {
        match self {
            Value::I256(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_vec(&self) -> Option<&[u8]> {
        match self {
            Value::ByteVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Value::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_contract(&self) -> Option<ContractId> {
        match self {
            Value::Contract(id) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_matches_declared_type() {
        assert_eq!(Type::Bool.zero_value(), Value::Bool(false));
        assert_eq!(Type::U256.zero_value().value_type(), Type::U256);
    }

    #[test]
    fn array_flattened_len_multiplies_by_dimension() {
        let ty = Type::FixedSizeArray(Box::new(Type::U256), 3);
        assert_eq!(ty.flattened_len(), 3);
        let nested = Type::FixedSizeArray(Box::new(ty), 2);
        assert_eq!(nested.flattened_len(), 6);
    }
}
