//! Property-based tests for the compiler front-to-back pipeline.
//!
//! Roundtrip: compiling the same script twice from the same AST produces
//! byte-for-byte identical methods — the compiler has no hidden
//! nondeterminism (no iteration over an unordered map driving codegen, no
//! id leaking between runs).

use alephium_compiler::compile::{build_env, compile_script_stateless};
use alephium_config::CompilerConfig;
use alephium_core::U256;
use alephium_lang::ast::{BinaryOp, Expr, ExprKind, FuncDef, Literal, NodeId, ScriptDef, Stmt, TypeName};
use proptest::prelude::*;

/// Builds `((((v0 + v1) + v2) + ...))`, one `NodeId` per node.
fn sum_expr(values: &[u64]) -> Expr {
    let mut next_id = 0u32;
    let mut fresh = || {
        let id = NodeId(next_id);
        next_id += 1;
        id
    };
    let mut acc = Expr { id: fresh(), kind: ExprKind::Const(Literal::U256(U256::from_u64(values[0]))) };
    for v in &values[1..] {
        let rhs = Expr { id: fresh(), kind: ExprKind::Const(Literal::U256(U256::from_u64(*v))) };
        acc = Expr { id: fresh(), kind: ExprKind::Binary(BinaryOp::Add, Box::new(acc), Box::new(rhs)) };
    }
    acc
}

fn sum_script(values: &[u64]) -> ScriptDef {
    ScriptDef {
        funcs: vec![FuncDef {
            name: "main".into(),
            is_public: true,
            is_payable: false,
            params: vec![],
            return_types: vec![TypeName::U256],
            body: vec![Stmt::Return(vec![sum_expr(values)])],
        }],
    }
}

proptest! {
    #[test]
    fn compiling_the_same_script_twice_is_deterministic(values in prop::collection::vec(0u64..10_000, 1..12)) {
        let script = sum_script(&values);
        let config = CompilerConfig::default();
        let env = build_env(&[]).unwrap();

        let first = compile_script_stateless(&script, &config, &env).unwrap();
        let second = compile_script_stateless(&script, &config, &env).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn compiled_script_has_one_method_per_source_function(values in prop::collection::vec(0u64..10_000, 1..12)) {
        let script = sum_script(&values);
        let config = CompilerConfig::default();
        let env = build_env(&[]).unwrap();

        let compiled = compile_script_stateless(&script, &config, &env).unwrap();
        prop_assert_eq!(compiled.methods.len(), script.funcs.len());
    }
}
