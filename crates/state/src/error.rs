//! Maps the trie/storage layer's failures onto the VM's [`IOError`], which
//! is the only error vocabulary [`crate::world_state::WorldState`] is
//! allowed to surface across the `WorldStateView` boundary.

use alephium_vm::IOError;
use hex::encode as hex_encode;

pub(crate) fn load_contract_failed(id: [u8; 32], source: impl std::fmt::Display) -> IOError {
    IOError::LoadContract(format!("{}: {source}", hex_encode(id)))
}

pub(crate) fn update_state_failed<E>(_source: E) -> IOError {
    IOError::UpdateState
}
