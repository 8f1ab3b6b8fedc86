//! A contract's persisted state: code reference, field values and the
//! asset output backing it. This is the payload stored under a contract id
//! in the `contractState` trie (see [`crate::world_state::WorldState`]).

use alephium_io::{BinaryReader, BinaryWriter, Result, Serializable};
use alephium_vm::{AssetOutput, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ContractState {
    pub code_hash: [u8; 32],
    pub state_hash: [u8; 32],
    pub fields: Vec<Value>,
    pub output_ref: [u8; 32],
    pub contract_output: AssetOutput,
}

impl Serializable for ContractState {
    fn serialize(&self, w: &mut BinaryWriter) {
        w.write_fixed_bytes(&self.code_hash);
        w.write_fixed_bytes(&self.state_hash);
        w.write_varuint(self.fields.len() as u64);
        for field in &self.fields {
            let bytes = field.to_bytes();
            w.write_bytes(&bytes);
        }
        w.write_fixed_bytes(&self.output_ref);
        let output_bytes = self.contract_output.to_bytes();
        w.write_bytes(&output_bytes);
    }

    fn deserialize(r: &mut BinaryReader) -> Result<Self> {
        let code_hash: [u8; 32] = r.read_fixed_bytes(32)?.try_into().unwrap();
        let state_hash: [u8; 32] = r.read_fixed_bytes(32)?.try_into().unwrap();
        let field_count = r.read_varuint()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let bytes = r.read_bytes()?;
            fields.push(Value::from_bytes(&bytes)?);
        }
        let output_ref: [u8; 32] = r.read_fixed_bytes(32)?.try_into().unwrap();
        let output_bytes = r.read_bytes()?;
        let contract_output = AssetOutput::from_bytes(&output_bytes)?;
        Ok(ContractState {
            code_hash,
            state_hash,
            fields,
            output_ref,
            contract_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_core::{Address, U256};

    fn sample() -> ContractState {
        ContractState {
            code_hash: [1u8; 32],
            state_hash: [2u8; 32],
            fields: vec![Value::U256(U256::from_u64(7)), Value::Bool(true)],
            output_ref: [3u8; 32],
            contract_output: AssetOutput {
                lockup_script: Address::zero(),
                alf_amount: U256::from_u64(100),
                tokens: vec![],
            },
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let state = sample();
        let bytes = state.to_bytes();
        assert_eq!(ContractState::from_bytes(&bytes).unwrap(), state);
    }
}
