//! Configuration record for the compiler and the VM's resource limits.
//!
//! Of everything in here, only [`CompilerConfig::loop_unrolling_limit`] is a
//! currently-honored CLI/config surface per spec; the rest are named
//! constants pulled out of the VM/emulator so the protocol-level limits are
//! auditable in one place rather than scattered as magic numbers.

use serde::{Deserialize, Serialize};

/// Compiler-facing configuration. Only `loop_unrolling_limit` is read by
/// the compiler today; the struct exists so adding a second honored option
/// later doesn't change every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Maximum number of iterations a `Loop{start, end, step}` may unroll to.
    pub loop_unrolling_limit: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            loop_unrolling_limit: 512,
        }
    }
}

/// Maximum number of operand-stack slots per execution.
pub const OPERAND_STACK_CAPACITY: usize = 1024;

/// Maximum number of nested call frames per execution.
pub const FRAME_STACK_CAPACITY: usize = 1024;

/// Single-byte signed jump offset range enforced by the emitter — a
/// protocol-level limit (see "Short branches only"), not an implementation
/// shortcut.
pub const MAX_BRANCH_INSTRS: usize = 255;

/// Number of dummy signatures the emulator pads into the input- and
/// script-signature stacks, sized for the worst case a real transaction
/// could present. Emulator-only padding, never used on the execution path.
pub const EMULATOR_DUMMY_SIGNATURE_COUNT: usize = 16;

/// Maximum gas chargeable within a single transaction's script execution.
pub const MAXIMAL_GAS_PER_TX: u64 = 5_000_000;

/// Gas floor for any transaction carrying a script.
pub const MINIMAL_GAS: u64 = 20_000;

/// Number of most-recent blocks per chain retained by the pruner.
pub const PRUNER_RETAINED_BLOCKS: u64 = 128;

/// Expected number of trie-node hashes reachable from the retained window,
/// used to size the pruner's bloom filter.
pub const PRUNER_EXPECTED_HASHES: u64 = 80_000_000;

/// Target false-positive rate for the pruner's bloom filter.
pub const PRUNER_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Batch size the pruner streams trie nodes in while scanning the store.
pub const PRUNER_BATCH_SIZE: usize = 256;

/// Number of sharding groups a transaction's first input may belong to.
/// The emulator derives a dry-run transaction's intra-group chain from
/// this; a real node's group count is a network-wide constant of the same
/// kind.
pub const GROUP_COUNT: u8 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loop_unrolling_limit_is_positive() {
        assert!(CompilerConfig::default().loop_unrolling_limit > 0);
    }

    #[test]
    fn serializes_round_trip() {
        let cfg = CompilerConfig {
            loop_unrolling_limit: 10,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CompilerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
