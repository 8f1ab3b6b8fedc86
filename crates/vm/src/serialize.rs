//! The dense, bit-exact wire format: opcode byte followed by fixed-layout
//! immediates. A script's on-chain representation is its byte-serialized
//! method array; `Serializable` is the only place this format is spelled
//! out for VM types.

use crate::context::AssetOutput;
use crate::instruction::Instruction;
use crate::method::{Method, StatefulContract, StatefulScript, StatelessScript};
use crate::value::{ContractId, Type, Value};
use alephium_core::{Address, I256, U256};
use alephium_io::{BinaryReader, BinaryWriter, IoError, Result, Serializable};
use std::sync::Arc;

impl Serializable for Value {
    fn serialize(&self, w: &mut BinaryWriter) {
        match self {
            Value::Bool(v) => {
                w.write_u8(0);
                w.write_u8(*v as u8);
            }
            Value::U256(v) => {
                w.write_u8(1);
                w.write_fixed_bytes(&v.to_big_endian_fixed());
            }
            Value::I256(v) => {
                w.write_u8(2);
                w.write_fixed_bytes(&v.to_be_bytes_fixed());
            }
            Value::ByteVec(v) => {
                w.write_u8(3);
                w.write_bytes(v);
            }
            Value::Address(v) => {
                w.write_u8(4);
                w.write_fixed_bytes(v.as_bytes());
            }
            Value::Contract(id) => {
                w.write_u8(5);
                w.write_fixed_bytes(&id.0);
            }
        }
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        match r.read_u8()? {
            0 => Ok(Value::Bool(r.read_u8()? != 0)),
            1 => {
                let bytes = r.read_fixed_bytes(32)?;
                let arr: [u8; 32] = bytes.try_into().unwrap();
                U256::from_big_endian(&arr)
                    .map(Value::U256)
                    .map_err(|_| IoError::OutOfRange { what: "U256" })
            }
            2 => {
                let bytes = r.read_fixed_bytes(32)?;
                let arr: [u8; 32] = bytes.try_into().unwrap();
                I256::from_be_bytes_fixed(&arr)
                    .map(Value::I256)
                    .map_err(|_| IoError::OutOfRange { what: "I256" })
            }
            3 => Ok(Value::ByteVec(Arc::new(r.read_bytes()?))),
            4 => {
                let bytes = r.read_fixed_bytes(32)?;
                Address::from_bytes(&bytes)
                    .map(Value::Address)
                    .map_err(|_| IoError::OutOfRange { what: "Address" })
            }
            5 => {
                let bytes = r.read_fixed_bytes(32)?;
                let arr: [u8; 32] = bytes.try_into().unwrap();
                Ok(Value::Contract(ContractId(arr)))
            }
            _ => Err(IoError::OutOfRange { what: "Value tag" }),
        }
    }
}

impl Serializable for Type {
    fn serialize(&self, w: &mut BinaryWriter) {
        match self {
            Type::Bool => w.write_u8(0),
            Type::U256 => w.write_u8(1),
            Type::I256 => w.write_u8(2),
            Type::ByteVec => w.write_u8(3),
            Type::Address => w.write_u8(4),
            Type::Contract(id) => {
                w.write_u8(5);
                w.write_fixed_bytes(&id.0);
            }
            Type::FixedSizeArray(base, len) => {
                w.write_u8(6);
                w.write_varuint(*len as u64);
                base.serialize(w);
            }
        }
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        match r.read_u8()? {
            0 => Ok(Type::Bool),
            1 => Ok(Type::U256),
            2 => Ok(Type::I256),
            3 => Ok(Type::ByteVec),
            4 => Ok(Type::Address),
            5 => {
                let bytes = r.read_fixed_bytes(32)?;
                let arr: [u8; 32] = bytes.try_into().unwrap();
                Ok(Type::Contract(ContractId(arr)))
            }
            6 => {
                let len = r.read_varuint()? as usize;
                let base = Type::deserialize(r)?;
                Ok(Type::FixedSizeArray(Box::new(base), len))
            }
            _ => Err(IoError::OutOfRange { what: "Type tag" }),
        }
    }
}

/// Opcode tags. Grouped in the same order as [`Instruction`]'s definition.
mod opcode {
    pub const CONST_BOOL: u8 = 0x00;
    pub const CONST_U256: u8 = 0x01;
    pub const CONST_I256: u8 = 0x02;
    pub const CONST_BYTE_VEC: u8 = 0x03;
    pub const CONST_ADDRESS: u8 = 0x04;
    pub const ADD_U256: u8 = 0x10;
    pub const SUB_U256: u8 = 0x11;
    pub const MUL_U256: u8 = 0x12;
    pub const DIV_U256: u8 = 0x13;
    pub const MOD_U256: u8 = 0x14;
    pub const ADD_I256: u8 = 0x15;
    pub const SUB_I256: u8 = 0x16;
    pub const MUL_I256: u8 = 0x17;
    pub const DIV_I256: u8 = 0x18;
    pub const MOD_I256: u8 = 0x19;
    pub const EQ_U256: u8 = 0x20;
    pub const LT_U256: u8 = 0x21;
    pub const GT_U256: u8 = 0x22;
    pub const LE_U256: u8 = 0x23;
    pub const GE_U256: u8 = 0x24;
    pub const AND: u8 = 0x30;
    pub const OR: u8 = 0x31;
    pub const NOT: u8 = 0x32;
    pub const JUMP: u8 = 0x40;
    pub const IF_TRUE: u8 = 0x41;
    pub const IF_FALSE: u8 = 0x42;
    pub const RETURN: u8 = 0x43;
    pub const CALL_LOCAL: u8 = 0x50;
    pub const CALL_EXTERNAL: u8 = 0x51;
    pub const LOAD_LOCAL: u8 = 0x60;
    pub const STORE_LOCAL: u8 = 0x61;
    pub const LOAD_FIELD: u8 = 0x62;
    pub const STORE_FIELD: u8 = 0x63;
    pub const CONTRACT_CONV: u8 = 0x64;
    pub const POP: u8 = 0x65;
    pub const BLAKE2B: u8 = 0x70;
    pub const KECCAK256: u8 = 0x71;
    pub const VERIFY_TX_SIGNATURE: u8 = 0x72;
    pub const ETH_EC_RECOVER: u8 = 0x73;
    pub const LOG: u8 = 0x80;
    pub const APPROVE_ALF: u8 = 0x90;
    pub const TRANSFER_ALF: u8 = 0x91;
    pub const USE_CONTRACT_ASSETS: u8 = 0x92;
    pub const GENERATE_OUTPUT: u8 = 0x93;
}

impl Serializable for Instruction {
    fn serialize(&self, w: &mut BinaryWriter) {
        use opcode::*;
        match self {
            Instruction::ConstBool(v) => {
                w.write_u8(CONST_BOOL);
                w.write_u8(*v as u8);
            }
            Instruction::ConstU256(v) => {
                w.write_u8(CONST_U256);
                w.write_fixed_bytes(&v.to_big_endian_fixed());
            }
            Instruction::ConstI256(v) => {
                w.write_u8(CONST_I256);
                w.write_fixed_bytes(&v.to_be_bytes_fixed());
            }
            Instruction::ConstByteVec(v) => {
                w.write_u8(CONST_BYTE_VEC);
                w.write_bytes(v);
            }
            Instruction::ConstAddress(v) => {
                w.write_u8(CONST_ADDRESS);
                w.write_fixed_bytes(v.as_bytes());
            }
            Instruction::AddU256 => w.write_u8(ADD_U256),
            Instruction::SubU256 => w.write_u8(SUB_U256),
            Instruction::MulU256 => w.write_u8(MUL_U256),
            Instruction::DivU256 => w.write_u8(DIV_U256),
            Instruction::ModU256 => w.write_u8(MOD_U256),
            Instruction::AddI256 => w.write_u8(ADD_I256),
            Instruction::SubI256 => w.write_u8(SUB_I256),
            Instruction::MulI256 => w.write_u8(MUL_I256),
            Instruction::DivI256 => w.write_u8(DIV_I256),
            Instruction::ModI256 => w.write_u8(MOD_I256),
            Instruction::EqU256 => w.write_u8(EQ_U256),
            Instruction::LtU256 => w.write_u8(LT_U256),
            Instruction::GtU256 => w.write_u8(GT_U256),
            Instruction::LeU256 => w.write_u8(LE_U256),
            Instruction::GeU256 => w.write_u8(GE_U256),
            Instruction::And => w.write_u8(AND),
            Instruction::Or => w.write_u8(OR),
            Instruction::Not => w.write_u8(NOT),
            Instruction::Jump(offset) => {
                w.write_u8(JUMP);
                w.write_i8(clamp_branch(*offset));
            }
            Instruction::IfTrue(offset) => {
                w.write_u8(IF_TRUE);
                w.write_i8(clamp_branch(*offset));
            }
            Instruction::IfFalse(offset) => {
                w.write_u8(IF_FALSE);
                w.write_i8(clamp_branch(*offset));
            }
            Instruction::Return => w.write_u8(RETURN),
            Instruction::CallLocal(idx) => {
                w.write_u8(CALL_LOCAL);
                w.write_u16(*idx);
            }
            Instruction::CallExternal(idx) => {
                w.write_u8(CALL_EXTERNAL);
                w.write_u16(*idx);
            }
            Instruction::LoadLocal(idx) => {
                w.write_u8(LOAD_LOCAL);
                w.write_u16(*idx);
            }
            Instruction::StoreLocal(idx) => {
                w.write_u8(STORE_LOCAL);
                w.write_u16(*idx);
            }
            Instruction::LoadField(idx) => {
                w.write_u8(LOAD_FIELD);
                w.write_u16(*idx);
            }
            Instruction::StoreField(idx) => {
                w.write_u8(STORE_FIELD);
                w.write_u16(*idx);
            }
            Instruction::ContractConv => w.write_u8(CONTRACT_CONV),
            Instruction::Pop => w.write_u8(POP),
            Instruction::Blake2bHash => w.write_u8(BLAKE2B),
            Instruction::Keccak256Hash => w.write_u8(KECCAK256),
            Instruction::VerifyTxSignature => w.write_u8(VERIFY_TX_SIGNATURE),
            Instruction::EthEcRecover => w.write_u8(ETH_EC_RECOVER),
            Instruction::Log { field_count, event_id } => {
                w.write_u8(LOG);
                w.write_u8(*field_count);
                w.write_bytes(event_id);
            }
            Instruction::ApproveAlf => w.write_u8(APPROVE_ALF),
            Instruction::TransferAlf => w.write_u8(TRANSFER_ALF),
            Instruction::UseContractAssets => w.write_u8(USE_CONTRACT_ASSETS),
            Instruction::GenerateOutput => w.write_u8(GENERATE_OUTPUT),
        }
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        use opcode::*;
        let op = r.read_u8()?;
        Ok(match op {
            CONST_BOOL => Instruction::ConstBool(r.read_u8()? != 0),
            CONST_U256 => {
                let bytes = r.read_fixed_bytes(32)?;
                let arr: [u8; 32] = bytes.try_into().unwrap();
                Instruction::ConstU256(
                    U256::from_big_endian(&arr).map_err(|_| IoError::OutOfRange { what: "U256" })?,
                )
            }
            CONST_I256 => {
                let bytes = r.read_fixed_bytes(32)?;
                let arr: [u8; 32] = bytes.try_into().unwrap();
                Instruction::ConstI256(
                    I256::from_be_bytes_fixed(&arr).map_err(|_| IoError::OutOfRange { what: "I256" })?,
                )
            }
            CONST_BYTE_VEC => Instruction::ConstByteVec(Arc::new(r.read_bytes()?)),
            CONST_ADDRESS => {
                let bytes = r.read_fixed_bytes(32)?;
                Instruction::ConstAddress(
                    Address::from_bytes(&bytes).map_err(|_| IoError::OutOfRange { what: "Address" })?,
                )
            }
            ADD_U256 => Instruction::AddU256,
            SUB_U256 => Instruction::SubU256,
            MUL_U256 => Instruction::MulU256,
            DIV_U256 => Instruction::DivU256,
            MOD_U256 => Instruction::ModU256,
            ADD_I256 => Instruction::AddI256,
            SUB_I256 => Instruction::SubI256,
            MUL_I256 => Instruction::MulI256,
            DIV_I256 => Instruction::DivI256,
            MOD_I256 => Instruction::ModI256,
            EQ_U256 => Instruction::EqU256,
            LT_U256 => Instruction::LtU256,
            GT_U256 => Instruction::GtU256,
            LE_U256 => Instruction::LeU256,
            GE_U256 => Instruction::GeU256,
            AND => Instruction::And,
            OR => Instruction::Or,
            NOT => Instruction::Not,
            JUMP => Instruction::Jump(r.read_i8()? as i32),
            IF_TRUE => Instruction::IfTrue(r.read_i8()? as i32),
            IF_FALSE => Instruction::IfFalse(r.read_i8()? as i32),
            RETURN => Instruction::Return,
            CALL_LOCAL => Instruction::CallLocal(r.read_u16()?),
            CALL_EXTERNAL => Instruction::CallExternal(r.read_u16()?),
            LOAD_LOCAL => Instruction::LoadLocal(r.read_u16()?),
            STORE_LOCAL => Instruction::StoreLocal(r.read_u16()?),
            LOAD_FIELD => Instruction::LoadField(r.read_u16()?),
            STORE_FIELD => Instruction::StoreField(r.read_u16()?),
            CONTRACT_CONV => Instruction::ContractConv,
            POP => Instruction::Pop,
            BLAKE2B => Instruction::Blake2bHash,
            KECCAK256 => Instruction::Keccak256Hash,
            VERIFY_TX_SIGNATURE => Instruction::VerifyTxSignature,
            ETH_EC_RECOVER => Instruction::EthEcRecover,
            LOG => {
                let field_count = r.read_u8()?;
                let event_id = Arc::new(r.read_bytes()?);
                Instruction::Log { field_count, event_id }
            }
            APPROVE_ALF => Instruction::ApproveAlf,
            TRANSFER_ALF => Instruction::TransferAlf,
            USE_CONTRACT_ASSETS => Instruction::UseContractAssets,
            GENERATE_OUTPUT => Instruction::GenerateOutput,
            _ => return Err(IoError::OutOfRange { what: "opcode" }),
        })
    }
}

/// Jump offsets are single-byte at the protocol level (see "Short branches
/// only"); the compiler is responsible for never emitting one out of range.
fn clamp_branch(offset: i32) -> i8 {
    debug_assert!(
        offset >= i8::MIN as i32 && offset <= i8::MAX as i32,
        "branch offset {offset} exceeds the single-byte protocol limit"
    );
    offset as i8
}

impl Serializable for Method {
    fn serialize(&self, w: &mut BinaryWriter) {
        let mut flags = 0u8;
        if self.is_public {
            flags |= 0b01;
        }
        if self.is_payable {
            flags |= 0b10;
        }
        w.write_u8(flags);
        w.write_varuint(self.args_length as u64);
        w.write_varuint(self.locals_length as u64);
        w.write_varuint(self.return_length as u64);
        w.write_varuint(self.local_types.len() as u64);
        for ty in &self.local_types {
            ty.serialize(w);
        }
        w.write_varuint(self.instrs.len() as u64);
        for instr in &self.instrs {
            instr.serialize(w);
        }
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        let flags = r.read_u8()?;
        let is_public = flags & 0b01 != 0;
        let is_payable = flags & 0b10 != 0;
        let args_length = r.read_varuint()? as usize;
        let locals_length = r.read_varuint()? as usize;
        let return_length = r.read_varuint()? as usize;
        let local_types_len = r.read_varuint()? as usize;
        let mut local_types = Vec::with_capacity(local_types_len);
        for _ in 0..local_types_len {
            local_types.push(Type::deserialize(r)?);
        }
        let instrs_len = r.read_varuint()? as usize;
        let mut instrs = Vec::with_capacity(instrs_len);
        for _ in 0..instrs_len {
            instrs.push(Instruction::deserialize(r)?);
        }
        Ok(Method {
            is_public,
            is_payable,
            args_length,
            locals_length,
            return_length,
            local_types,
            instrs,
        })
    }
}

impl Serializable for AssetOutput {
    fn serialize(&self, w: &mut BinaryWriter) {
        w.write_fixed_bytes(self.lockup_script.as_bytes());
        w.write_fixed_bytes(&self.alf_amount.to_big_endian_fixed());
        w.write_varuint(self.tokens.len() as u64);
        for (token_id, amount) in &self.tokens {
            w.write_fixed_bytes(&token_id.to_big_endian_fixed());
            w.write_fixed_bytes(&amount.to_big_endian_fixed());
        }
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        let lockup_script = Address::from_bytes(&r.read_fixed_bytes(32)?)
            .map_err(|_| IoError::OutOfRange { what: "Address" })?;
        let alf_amount = read_u256(r)?;
        let token_count = r.read_varuint()? as usize;
        let mut tokens = Vec::with_capacity(token_count);
        for _ in 0..token_count {
            let token_id = read_u256(r)?;
            let amount = read_u256(r)?;
            tokens.push((token_id, amount));
        }
        Ok(AssetOutput {
            lockup_script,
            alf_amount,
            tokens,
        })
    }
}

fn read_u256(r: &mut BinaryReader) -> Result<U256> {
    let bytes = r.read_fixed_bytes(32)?;
    let arr: [u8; 32] = bytes.try_into().unwrap();
    U256::from_big_endian(&arr).map_err(|_| IoError::OutOfRange { what: "U256" })
}

fn write_methods(methods: &[Method], w: &mut BinaryWriter) {
    w.write_varuint(methods.len() as u64);
    for method in methods {
        method.serialize(w);
    }
}

fn read_methods(r: &mut BinaryReader) -> Result<Vec<Method>> {
    let len = r.read_varuint()? as usize;
    let mut methods = Vec::with_capacity(len);
    for _ in 0..len {
        methods.push(Method::deserialize(r)?);
    }
    Ok(methods)
}

impl Serializable for StatelessScript {
    fn serialize(&self, w: &mut BinaryWriter) {
        write_methods(&self.methods, w);
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        Ok(StatelessScript { methods: read_methods(r)? })
    }
}

impl Serializable for StatefulScript {
    fn serialize(&self, w: &mut BinaryWriter) {
        write_methods(&self.methods, w);
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        Ok(StatefulScript { methods: read_methods(r)? })
    }
}

impl Serializable for StatefulContract {
    fn serialize(&self, w: &mut BinaryWriter) {
        w.write_varuint(self.field_length as u64);
        write_methods(&self.methods, w);
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        let field_length = r.read_varuint()? as usize;
        let methods = read_methods(r)?;
        Ok(StatefulContract { field_length, methods })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_round_trips_every_variant() {
        let values = vec![
            Value::Bool(true),
            Value::U256(U256::from_u64(42)),
            Value::I256(I256::from_i64(-7)),
            Value::ByteVec(Arc::new(vec![1, 2, 3])),
            Value::Address(Address::zero()),
            Value::Contract(ContractId([9u8; 32])),
        ];
        for value in values {
            let bytes = value.to_bytes();
            assert_eq!(Value::from_bytes(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn instruction_round_trips_with_negative_jump_offset() {
        let instr = Instruction::Jump(-5);
        let bytes = instr.to_bytes();
        assert_eq!(Instruction::deserialize(&mut BinaryReader::new(&bytes)).unwrap(), instr);
    }

    #[test]
    fn contract_conv_round_trips() {
        let instr = Instruction::ContractConv;
        let bytes = instr.to_bytes();
        assert_eq!(Instruction::deserialize(&mut BinaryReader::new(&bytes)).unwrap(), instr);
    }

    #[test]
    fn pop_round_trips() {
        let instr = Instruction::Pop;
        let bytes = instr.to_bytes();
        assert_eq!(Instruction::deserialize(&mut BinaryReader::new(&bytes)).unwrap(), instr);
    }

    #[test]
    fn method_round_trips() {
        let method = Method {
            is_public: true,
            is_payable: true,
            args_length: 2,
            locals_length: 2,
            return_length: 1,
            local_types: vec![Type::U256, Type::U256],
            instrs: vec![
                Instruction::LoadLocal(0),
                Instruction::LoadLocal(1),
                Instruction::AddU256,
                Instruction::Return,
            ],
        };
        let bytes = method.to_bytes();
        assert_eq!(Method::from_bytes(&bytes).unwrap(), method);
    }

    #[test]
    fn asset_output_round_trips_with_tokens() {
        let output = AssetOutput {
            lockup_script: Address::zero(),
            alf_amount: U256::from_u64(100),
            tokens: vec![(U256::from_u64(1), U256::from_u64(2))],
        };
        let bytes = output.to_bytes();
        assert_eq!(AssetOutput::from_bytes(&bytes).unwrap(), output);
    }

    #[test]
    fn stateful_contract_round_trips() {
        let method = Method {
            is_public: true,
            is_payable: false,
            args_length: 0,
            locals_length: 0,
            return_length: 0,
            local_types: vec![],
            instrs: vec![Instruction::Return],
        };
        let contract = StatefulContract::new(3, vec![method]).unwrap();
        let bytes = contract.to_bytes();
        assert_eq!(StatefulContract::from_bytes(&bytes).unwrap(), contract);
    }
}
