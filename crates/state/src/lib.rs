//! Trie-backed world state sitting behind the VM's [`alephium_vm::WorldStateView`].
//!
//! This crate owns the one place the VM's abstract capability gets a real
//! backing store: contract lifecycle (create/get/use/update/remove) over a
//! sparse Merkle trie, with a staging/commit model matching the "staging
//! world state lives for one transaction; discarded on failure, merged on
//! success" lifecycle.

pub mod contract_state;
pub mod error;
pub mod world_state;

pub use contract_state::ContractState;
pub use world_state::{PersistedRoot, WorldState};
