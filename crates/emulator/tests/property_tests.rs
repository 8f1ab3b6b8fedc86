//! Property-based tests for the dry-run emulator.
//!
//! Gas monotonicity: `gas_used` never exceeds the chain's maximal
//! per-transaction gas budget, and is the same every time the same script
//! runs against the same staged inputs (a dry run has no hidden source of
//! nondeterminism).

use alephium_config::MAXIMAL_GAS_PER_TX;
use alephium_core::{Address, U256};
use alephium_emulator::chain::{BlockFlowView, ChainIndex, GroupIndex};
use alephium_emulator::emulate::emulate;
use alephium_emulator::transaction::TxInput;
use alephium_persistence::MemoryStore;
use alephium_state::{PersistedRoot, WorldState};
use alephium_vm::method::{Method, StatefulScript};
use alephium_vm::value::Type;
use alephium_vm::{AssetOutput, BlockEnv, IOError, Instruction};
use proptest::prelude::*;
use std::rc::Rc;

struct SingleGroupChain {
    store: Rc<MemoryStore>,
}

impl SingleGroupChain {
    fn new() -> Self {
        Self { store: Rc::new(MemoryStore::new()) }
    }
}

impl BlockFlowView for SingleGroupChain {
    type Store = MemoryStore;

    fn get_dryrun_block_env(&self, _chain_index: ChainIndex) -> Result<BlockEnv, IOError> {
        Ok(BlockEnv { chain_id: 1, timestamp: 0, difficulty_target: 0, hard_fork_identifier: 0 })
    }

    fn get_mutable_group_view_including_pool(
        &mut self,
        _group: GroupIndex,
    ) -> Result<WorldState<MemoryStore>, IOError> {
        Ok(WorldState::open(PersistedRoot::default(), self.store.clone()))
    }
}

fn sum_script(values: &[u64]) -> StatefulScript {
    let mut instrs = vec![Instruction::ConstU256(U256::from_u64(values[0]))];
    for v in &values[1..] {
        instrs.push(Instruction::ConstU256(U256::from_u64(*v)));
        instrs.push(Instruction::AddU256);
    }
    instrs.push(Instruction::Return);
    StatefulScript::new(vec![Method {
        is_public: true,
        is_payable: false,
        args_length: 0,
        locals_length: 0,
        return_length: 1,
        local_types: vec![Type::U256; 0],
        instrs,
    }])
    .unwrap()
}

fn sample_input() -> (TxInput, AssetOutput) {
    (
        TxInput { output_ref: [7u8; 32] },
        AssetOutput { lockup_script: Address::zero(), alf_amount: U256::from_u64(1_000_000), tokens: vec![] },
    )
}

proptest! {
    #[test]
    fn gas_used_never_exceeds_the_per_tx_maximum(values in prop::collection::vec(0u64..1_000, 1..12)) {
        let mut chain = SingleGroupChain::new();
        let script = sum_script(&values);
        let result = emulate(&mut chain, vec![sample_input()], vec![], &script, None, None).unwrap();
        prop_assert!(result.gas_used > 0);
        prop_assert!(result.gas_used < MAXIMAL_GAS_PER_TX);
    }

    #[test]
    fn dry_run_is_deterministic_across_repeated_calls(values in prop::collection::vec(0u64..1_000, 1..12)) {
        let script = sum_script(&values);

        let mut first_chain = SingleGroupChain::new();
        let first = emulate(&mut first_chain, vec![sample_input()], vec![], &script, None, None).unwrap();

        let mut second_chain = SingleGroupChain::new();
        let second = emulate(&mut second_chain, vec![sample_input()], vec![], &script, None, None).unwrap();

        prop_assert_eq!(first.gas_used, second.gas_used);
        prop_assert_eq!(first.return_values, second.return_values);
    }
}
