//! The instruction set. Every instruction advertises a gas cost; for
//! length-dependent instructions (hashing, byte-vector ops) the engine adds
//! a per-byte surcharge on top of the base cost returned here.

use alephium_core::{Address, I256, U256};
use std::sync::Arc;

/// Named gas costs. `BASE_CALL_COST` and `RETURN_COST` are charged by the
/// engine around a call/return rather than by a specific instruction.
pub mod gas {
    pub const BASE_CALL_COST: u64 = 200;
    pub const RETURN_COST: u64 = 40;
    pub const CONST_COST: u64 = 2;
    pub const LOAD_LOCAL_COST: u64 = 3;
    pub const STORE_LOCAL_COST: u64 = 3;
    pub const LOAD_FIELD_COST: u64 = 4;
    pub const STORE_FIELD_COST: u64 = 4;
    pub const ARITHMETIC_COST: u64 = 3;
    pub const COMPARISON_COST: u64 = 3;
    pub const LOGICAL_COST: u64 = 2;
    pub const JUMP_COST: u64 = 2;
    pub const CALL_EXTERNAL_COST: u64 = 300;
    pub const HASH_BASE_COST: u64 = 30;
    pub const HASH_PER_BYTE_COST: u64 = 1;
    pub const SIGNATURE_VERIFY_COST: u64 = 2_000;
    pub const ASSET_OP_COST: u64 = 500;
    pub const LOG_BASE_COST: u64 = 100;
    pub const LOG_PER_FIELD_COST: u64 = 20;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    ConstBool(bool),
    ConstU256(U256),
    ConstI256(I256),
    ConstByteVec(Arc<Vec<u8>>),
    ConstAddress(Address),

    AddU256,
    SubU256,
    MulU256,
    DivU256,
    ModU256,

    AddI256,
    SubI256,
    MulI256,
    DivI256,
    ModI256,

    EqU256,
    LtU256,
    GtU256,
    LeU256,
    GeU256,

    And,
    Or,
    Not,

    /// Signed byte offset relative to the instruction following this one.
    Jump(i32),
    IfTrue(i32),
    IfFalse(i32),
    Return,

    CallLocal(u16),
    CallExternal(u16),

    LoadLocal(u16),
    StoreLocal(u16),
    LoadField(u16),
    StoreField(u16),

    /// Pops a 32-byte `ByteVec` and pushes it reinterpreted as a `Contract`
    /// handle. Fails `TypeMismatch` if the byte vector isn't exactly 32
    /// bytes.
    ContractConv,

    /// Pops and discards one value. Emitted for a call statement whose
    /// return value is unused.
    Pop,

    Blake2bHash,
    Keccak256Hash,
    VerifyTxSignature,
    EthEcRecover,

    Log {
        field_count: u8,
        event_id: Arc<Vec<u8>>,
    },

    ApproveAlf,
    TransferAlf,
    UseContractAssets,
    GenerateOutput,
}

impl Instruction {
    /// The fixed part of this instruction's gas cost, independent of any
    /// runtime-sized operand.
    pub fn base_gas_cost(&self) -> u64 {
        use gas::*;
        match self {
            Instruction::ConstBool(_)
            | Instruction::ConstU256(_)
            | Instruction::ConstI256(_)
            | Instruction::ConstByteVec(_)
            | Instruction::ConstAddress(_) => CONST_COST,

            Instruction::AddU256
            | Instruction::SubU256
            | Instruction::MulU256
            | Instruction::DivU256
            | Instruction::ModU256
            | Instruction::AddI256
            | Instruction::SubI256
            | Instruction::MulI256
            | Instruction::DivI256
            | Instruction::ModI256 => ARITHMETIC_COST,

            Instruction::EqU256
            | Instruction::LtU256
            | Instruction::GtU256
            | Instruction::LeU256
            | Instruction::GeU256 => COMPARISON_COST,

            Instruction::And | Instruction::Or | Instruction::Not => LOGICAL_COST,

            Instruction::Jump(_) | Instruction::IfTrue(_) | Instruction::IfFalse(_) => JUMP_COST,
            Instruction::Return => RETURN_COST,

            Instruction::CallLocal(_) => BASE_CALL_COST,
            Instruction::CallExternal(_) => CALL_EXTERNAL_COST,

            Instruction::LoadLocal(_) => LOAD_LOCAL_COST,
            Instruction::StoreLocal(_) => STORE_LOCAL_COST,
            Instruction::LoadField(_) => LOAD_FIELD_COST,
            Instruction::StoreField(_) => STORE_FIELD_COST,
            Instruction::ContractConv => CONST_COST,
            Instruction::Pop => CONST_COST,

            Instruction::Blake2bHash | Instruction::Keccak256Hash => HASH_BASE_COST,
            Instruction::VerifyTxSignature | Instruction::EthEcRecover => SIGNATURE_VERIFY_COST,

            Instruction::Log { field_count, .. } => {
                LOG_BASE_COST + LOG_PER_FIELD_COST * (*field_count as u64)
            }

            Instruction::ApproveAlf
            | Instruction::TransferAlf
            | Instruction::UseContractAssets
            | Instruction::GenerateOutput => ASSET_OP_COST,
        }
    }

    /// Whether this instruction may only appear in a stateful method body.
    pub fn is_stateful_only(&self) -> bool {
        matches!(
            self,
            Instruction::ApproveAlf
                | Instruction::TransferAlf
                | Instruction::UseContractAssets
                | Instruction::GenerateOutput
                | Instruction::Log { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_two_scenario_gas_matches_named_constants() {
        let expected = gas::BASE_CALL_COST
            + 2 * gas::LOAD_LOCAL_COST
            + Instruction::AddU256.base_gas_cost()
            + gas::RETURN_COST;
        assert_eq!(
            expected,
            gas::BASE_CALL_COST + 2 * gas::LOAD_LOCAL_COST + gas::ARITHMETIC_COST + gas::RETURN_COST
        );
    }

    #[test]
    fn log_cost_scales_with_field_count() {
        let event_id = Arc::new(vec![1, 2, 3]);
        let three = Instruction::Log {
            field_count: 3,
            event_id: event_id.clone(),
        };
        let zero = Instruction::Log {
            field_count: 0,
            event_id,
        };
        assert!(three.base_gas_cost() > zero.base_gas_cost());
    }
}
