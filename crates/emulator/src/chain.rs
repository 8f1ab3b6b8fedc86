//! The chain collaborator a real node would implement: everything the
//! emulator needs to know about sharding and the block it would mine
//! into, without depending on a P2P stack or a mempool of its own.

use alephium_config::GROUP_COUNT;
use alephium_persistence::KvStore;
use alephium_state::WorldState;
use alephium_vm::{BlockEnv, IOError};

/// A sharding group. The VM executes only within one intra-group chain
/// per transaction; cross-group effects are the enclosing layer's
/// responsibility, not the VM's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupIndex(pub u8);

impl GroupIndex {
    /// Derives the group a transaction belongs to from the output its
    /// first input spends. Real sharding assigns a group per lockup
    /// script; this hashes the referenced output so the emulator doesn't
    /// need the script's group-assignment rule to pick a chain to dry-run
    /// against.
    pub fn from_output_ref(output_ref: &[u8; 32]) -> Self {
        let hash = alephium_cryptography::blake2b_256(output_ref);
        GroupIndex(hash[0] % GROUP_COUNT)
    }
}

/// An intra-group chain coordinate. The emulator only ever builds the
/// degenerate `from == to` case: a script dry-run never crosses groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainIndex {
    pub from_group: GroupIndex,
    pub to_group: GroupIndex,
}

impl ChainIndex {
    pub fn intra_group(group: GroupIndex) -> Self {
        Self {
            from_group: group,
            to_group: group,
        }
    }
}

/// The block-flow collaborator: the emulator asks it for a dry-run block
/// environment and a mutable view of a group's world state including
/// pending mempool effects. A full node backs this with its block cache
/// and mempool; nothing in this crate depends on either.
pub trait BlockFlowView {
    type Store: KvStore;

    fn get_dryrun_block_env(&self, chain_index: ChainIndex) -> Result<BlockEnv, IOError>;

    /// Returns a world state for `group` that already reflects any
    /// mempool transactions pending against it. The emulator stages a
    /// copy of whatever this returns and never mutates it directly.
    fn get_mutable_group_view_including_pool(
        &mut self,
        group: GroupIndex,
    ) -> Result<WorldState<Self::Store>, IOError>;
}
