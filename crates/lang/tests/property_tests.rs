//! Property-based tests for the lexer/parser front end.
//!
//! Roundtrip: for every `U256` value, printing it as a decimal literal and
//! parsing that literal back recovers the same value, independent of how
//! many digits or leading context surrounds it.

use alephium_core::U256;
use alephium_lang::ast::{Expr, ExprKind, Literal, Stmt};
use alephium_lang::parser::parse;
use proptest::prelude::*;

fn parse_return_literal(src_value: &str) -> U256 {
    let source = format!("TxContract C {{ pub fn f() -> U256 {{ return {src_value}; }} }}");
    let unit = parse(&source).unwrap();
    let contract = match unit {
        alephium_lang::ast::Unit::Contract(c) => c,
        other => panic!("expected a contract, got {other:?}"),
    };
    match &contract.funcs[0].body[0] {
        Stmt::Return(values) => match &values[0] {
            Expr { kind: ExprKind::Const(Literal::U256(v)), .. } => v.clone(),
            other => panic!("expected a U256 literal, got {other:?}"),
        },
        other => panic!("expected a return statement, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn decimal_literal_roundtrips_through_lex_and_parse(v in any::<u64>()) {
        let value = U256::from_u64(v);
        let parsed = parse_return_literal(&v.to_string());
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn leading_zeros_do_not_change_the_parsed_value(v in 1u64..1_000_000, pad in 0usize..5) {
        let text = format!("{}{}", "0".repeat(pad), v);
        let parsed = parse_return_literal(&text);
        prop_assert_eq!(parsed, U256::from_u64(v));
    }
}
