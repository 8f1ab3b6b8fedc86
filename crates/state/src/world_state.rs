//! The trie-backed world state: three sparse Merkle tries (`outputState`,
//! `contractState`, `codeState`) sharing one key-value store, exposed to
//! the VM through [`alephium_vm::WorldStateView`].
//!
//! `staging()` clones the current tries (cheap — a root reference plus a
//! shared `Rc` to the store) so mutations during one execution never touch
//! the persisted snapshot until `commit()` is called on the staged copy.

use crate::contract_state::ContractState;
use crate::error::{load_contract_failed, update_state_failed};
use alephium_io::Serializable;
use alephium_persistence::KvStore;
use alephium_trie::Trie;
use alephium_vm::{AssetOutput, ContractId, IOError, Value, WorldStateView};
use std::rc::Rc;

/// The three Merkle roots a [`WorldState`] commits to, naming a persisted
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistedRoot {
    pub output_root: Option<[u8; 32]>,
    pub contract_root: Option<[u8; 32]>,
    pub code_root: Option<[u8; 32]>,
}

pub struct WorldState<S: KvStore> {
    output_state: Trie<S>,
    contract_state: Trie<S>,
    code_state: Trie<S>,
}

impl<S: KvStore> Clone for WorldState<S> {
    fn clone(&self) -> Self {
        Self {
            output_state: self.output_state.clone(),
            contract_state: self.contract_state.clone(),
            code_state: self.code_state.clone(),
        }
    }
}

impl<S: KvStore> WorldState<S> {
    /// Opens a world state at `roots`, reading through `store`. Pass
    /// [`PersistedRoot::default`] to open an empty world state.
    pub fn open(roots: PersistedRoot, store: Rc<S>) -> Self {
        Self {
            output_state: Trie::open(roots.output_root, store.clone()),
            contract_state: Trie::open(roots.contract_root, store.clone()),
            code_state: Trie::open(roots.code_root, store),
        }
    }

    /// Returns a mutable overlay over this world state. See the
    /// "Staging isolation" property: mutating the returned copy never
    /// touches `self` until the caller discards `self` and adopts the
    /// staged copy's committed roots.
    pub fn staging(&self) -> Self {
        self.clone()
    }

    /// Commits every staged node across all three tries and returns the
    /// new persisted root.
    pub fn commit(&mut self) -> Result<PersistedRoot, IOError> {
        let _span = tracing::debug_span!("world_state_commit").entered();
        let output_root = self.output_state.commit().map_err(update_state_failed)?;
        let contract_root = self.contract_state.commit().map_err(update_state_failed)?;
        let code_root = self.code_state.commit().map_err(update_state_failed)?;
        tracing::debug!(?output_root, ?contract_root, ?code_root, "world state committed");
        Ok(PersistedRoot {
            output_root,
            contract_root,
            code_root,
        })
    }

    /// Stores compiled contract code under its content hash, a prerequisite
    /// to `createContractUnsafe` referencing it.
    pub fn store_code(&mut self, code_hash: [u8; 32], code_bytes: Vec<u8>) -> Result<(), IOError> {
        self.code_state
            .insert(&code_hash, code_bytes)
            .map_err(update_state_failed)
    }

    fn load_contract(&self, id: ContractId) -> Result<ContractState, IOError> {
        let bytes = self
            .contract_state
            .get(&id.0)
            .map_err(|e| load_contract_failed(id.0, e))?
            .ok_or_else(|| load_contract_failed(id.0, "not found"))?;
        ContractState::from_bytes(&bytes).map_err(|e| load_contract_failed(id.0, e))
    }

    fn store_contract(&mut self, id: ContractId, state: &ContractState) -> Result<(), IOError> {
        self.contract_state
            .insert(&id.0, state.to_bytes())
            .map_err(update_state_failed)
    }
}

/// Derives a contract id from its creation output reference and code hash.
/// Grounded on `nextContractOutputRef`'s own hash-of-concatenation shape.
fn derive_contract_id(output_ref: [u8; 32], code_hash: [u8; 32]) -> ContractId {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&output_ref);
    data.extend_from_slice(&code_hash);
    ContractId::from_bytes(alephium_cryptography::blake2b_256(&data))
}

impl<S: KvStore> WorldStateView for WorldState<S> {
    type ContractHandle = ContractState;

    fn get_contract(&mut self, id: ContractId) -> Result<ContractState, IOError> {
        self.load_contract(id)
    }

    fn create_contract_unsafe(
        &mut self,
        code_hash: [u8; 32],
        state_hash: [u8; 32],
        fields: Vec<Value>,
        output_ref: [u8; 32],
        contract_output: AssetOutput,
    ) -> Result<ContractId, IOError> {
        let id = derive_contract_id(output_ref, code_hash);
        let state = ContractState {
            code_hash,
            state_hash,
            fields,
            output_ref,
            contract_output: contract_output.clone(),
        };
        self.store_contract(id, &state)?;
        self.output_state
            .insert(&output_ref, contract_output.to_bytes())
            .map_err(update_state_failed)?;
        Ok(id)
    }

    fn use_contract_asset(&mut self, id: ContractId) -> Result<([u8; 32], AssetOutput), IOError> {
        let state = self.load_contract(id)?;
        Ok((state.output_ref, state.contract_output))
    }

    fn update_contract(
        &mut self,
        id: ContractId,
        output_ref: [u8; 32],
        output: AssetOutput,
    ) -> Result<(), IOError> {
        let mut state = self.load_contract(id)?;
        state.output_ref = output_ref;
        state.contract_output = output.clone();
        self.store_contract(id, &state)?;
        self.output_state
            .insert(&output_ref, output.to_bytes())
            .map_err(update_state_failed)
    }

    fn remove_contract(&mut self, id: ContractId) -> Result<(), IOError> {
        let state = self.load_contract(id)?;
        self.contract_state.remove(&id.0).map_err(update_state_failed)?;
        self.output_state
            .remove(&state.output_ref)
            .map_err(update_state_failed)
    }

    fn contract_code_hash(&self, handle: &ContractState) -> [u8; 32] {
        handle.code_hash
    }

    fn contract_fields(&self, handle: &ContractState) -> Vec<Value> {
        handle.fields.clone()
    }

    fn get_code(&mut self, code_hash: [u8; 32]) -> Result<Vec<u8>, IOError> {
        self.code_state
            .get(&code_hash)
            .map_err(|e| load_contract_failed(code_hash, e))?
            .ok_or_else(|| load_contract_failed(code_hash, "code not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_core::{Address, U256};
    use alephium_persistence::MemoryStore;

    fn sample_output() -> AssetOutput {
        AssetOutput {
            lockup_script: Address::zero(),
            alf_amount: U256::from_u64(500),
            tokens: vec![],
        }
    }

    #[test]
    fn create_then_get_contract_round_trips() {
        let store = Rc::new(MemoryStore::new());
        let mut ws = WorldState::open(PersistedRoot::default(), store);
        let id = ws
            .create_contract_unsafe([1u8; 32], [2u8; 32], vec![Value::Bool(true)], [3u8; 32], sample_output())
            .unwrap();
        let state = ws.get_contract(id).unwrap();
        assert_eq!(state.fields, vec![Value::Bool(true)]);
    }

    #[test]
    fn get_missing_contract_is_load_error() {
        let store = Rc::new(MemoryStore::new());
        let mut ws: WorldState<MemoryStore> = WorldState::open(PersistedRoot::default(), store);
        let missing = ContractId::from_bytes([9u8; 32]);
        assert!(matches!(ws.get_contract(missing), Err(IOError::LoadContract(_))));
    }

    #[test]
    fn staging_mutation_does_not_affect_the_original() {
        let store = Rc::new(MemoryStore::new());
        let mut ws: WorldState<MemoryStore> = WorldState::open(PersistedRoot::default(), store);
        let id = ws
            .create_contract_unsafe([1u8; 32], [2u8; 32], vec![], [3u8; 32], sample_output())
            .unwrap();
        ws.commit().unwrap();

        let mut staged = ws.staging();
        staged.remove_contract(id).unwrap();
        assert!(staged.get_contract(id).is_err());
        assert!(ws.get_contract(id).is_ok());
    }

    #[test]
    fn store_code_then_get_code_round_trips() {
        let store = Rc::new(MemoryStore::new());
        let mut ws: WorldState<MemoryStore> = WorldState::open(PersistedRoot::default(), store);
        ws.store_code([4u8; 32], b"compiled-contract-bytes".to_vec()).unwrap();
        assert_eq!(ws.get_code([4u8; 32]).unwrap(), b"compiled-contract-bytes".to_vec());
    }

    #[test]
    fn remove_contract_clears_both_tries() {
        let store = Rc::new(MemoryStore::new());
        let mut ws: WorldState<MemoryStore> = WorldState::open(PersistedRoot::default(), store);
        let output_ref = [3u8; 32];
        let id = ws
            .create_contract_unsafe([1u8; 32], [2u8; 32], vec![], output_ref, sample_output())
            .unwrap();
        ws.remove_contract(id).unwrap();
        assert!(ws.get_contract(id).is_err());
        assert_eq!(ws.output_state.get(&output_ref).unwrap(), None);
    }
}
