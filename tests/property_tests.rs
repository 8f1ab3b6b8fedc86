//! Property-based tests exercising the full facade pipeline: source text
//! compiles through `compile_script_source`, then runs on the real engine.
//!
//! Roundtrip: a script that adds two arguments together returns their
//! exact sum for every pair of small `U256` operands, and charges the
//! same gas every time it is compiled and run again.

use alephium::{compile_script_source, CompilerConfig, CompilerEnv};
use alephium_core::U256;
use alephium_vm::method::Method;
use alephium_vm::{BlockEnv, Capability, ExecutionEngine, StatelessContext, TxEnv, Value};
use proptest::prelude::*;
use std::rc::Rc;

fn stateless_ctx() -> StatelessContext {
    StatelessContext {
        block_env: BlockEnv { chain_id: 0, timestamp: 0, difficulty_target: 0, hard_fork_identifier: 0 },
        tx_env: TxEnv { tx_id: [0u8; 32], prev_outputs: vec![], signature_stack: vec![] },
        gas_remaining: 1_000_000,
    }
}

const ADD_SOURCE: &str = "TxScript { pub fn add(a: U256, b: U256) -> U256 { return a + b; } }";

proptest! {
    #[test]
    fn compiled_add_script_returns_the_exact_sum(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let config = CompilerConfig::default();
        let env = CompilerEnv::default();
        let script = compile_script_source(ADD_SOURCE, &config, &env).unwrap();

        let mut ctx = stateless_ctx();
        let mut engine = ExecutionEngine::new();
        let methods: Rc<Vec<Rc<Method>>> = Rc::new(script.methods.iter().cloned().map(Rc::new).collect());
        let args = vec![Value::U256(U256::from_u64(a)), Value::U256(U256::from_u64(b))];
        let result = engine.run(methods, 0, args, &mut ctx).unwrap();

        let expected = U256::from_u64(a).checked_add(&U256::from_u64(b)).unwrap();
        prop_assert_eq!(result, vec![Value::U256(expected)]);
    }

    #[test]
    fn running_the_same_compiled_script_twice_charges_identical_gas(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let config = CompilerConfig::default();
        let env = CompilerEnv::default();
        let script = compile_script_source(ADD_SOURCE, &config, &env).unwrap();
        let methods: Rc<Vec<Rc<Method>>> = Rc::new(script.methods.iter().cloned().map(Rc::new).collect());

        let mut first_ctx = stateless_ctx();
        let mut first_engine = ExecutionEngine::new();
        let args = vec![Value::U256(U256::from_u64(a)), Value::U256(U256::from_u64(b))];
        first_engine.run(methods.clone(), 0, args.clone(), &mut first_ctx).unwrap();

        let mut second_ctx = stateless_ctx();
        let mut second_engine = ExecutionEngine::new();
        second_engine.run(methods, 0, args, &mut second_ctx).unwrap();

        prop_assert_eq!(first_ctx.gas_remaining(), second_ctx.gas_remaining());
    }
}
