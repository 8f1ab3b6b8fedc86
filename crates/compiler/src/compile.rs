//! Top-level entry points: unroll, type-check and emit every function of a
//! contract or script in turn, then package the result into the runtime
//! artifacts `alephium-vm` executes.

use crate::emit::emit_function;
use crate::error::CompileError;
use crate::symbol::{
    build_contract_symbols, build_script_funcs, contract_id_for_name, contract_interface,
    resolve_type, CompilerEnv, LocalScope,
};
use crate::typecheck::{check_function, FuncContext};
use crate::unroll::{max_node_id_in_block, unroll_block};
use alephium_config::CompilerConfig;
use alephium_lang::ast::{ContractDef, FuncDef, ScriptDef};
use alephium_vm::method::{Method, StatefulContract, StatefulScript, StatelessScript};
use alephium_vm::value::{ContractId, Type};
use std::collections::HashMap;

fn flatten_type_into_slots(ty: &Type, out: &mut Vec<Type>) {
    match ty {
        Type::FixedSizeArray(elem, len) => {
            for _ in 0..*len {
                flatten_type_into_slots(elem, out);
            }
        }
        other => out.push(other.clone()),
    }
}

/// Builds the per-slot type vector `Method::local_types` expects, indexed
/// by flattened offset rather than by variable.
fn local_types_vec(scope: &LocalScope, locals_length: usize) -> Vec<Type> {
    let mut types = vec![Type::U256; locals_length];
    for slot in scope.vars.values() {
        let mut flat = Vec::new();
        flatten_type_into_slots(&slot.ty, &mut flat);
        for (i, t) in flat.into_iter().enumerate() {
            types[slot.offset + i] = t;
        }
    }
    types
}

fn compile_method(
    func: &FuncDef,
    config: &CompilerConfig,
    ctx: &FuncContext,
) -> Result<Method, CompileError> {
    let mut next_id = max_node_id_in_block(&func.body) + 1;
    let body = unroll_block(&func.body, config.loop_unrolling_limit, &mut next_id)?;
    let unrolled = FuncDef {
        name: func.name.clone(),
        is_public: func.is_public,
        is_payable: func.is_payable,
        params: func.params.clone(),
        return_types: func.return_types.clone(),
        body,
    };
    let checked = check_function(&unrolled, ctx)?;
    let instrs = emit_function(&unrolled, &checked, ctx)?;

    let args_length: usize = unrolled
        .params
        .iter()
        .map(|p| resolve_type(&p.ty).flattened_len())
        .sum();
    let return_length: usize = unrolled
        .return_types
        .iter()
        .map(|t| resolve_type(t).flattened_len())
        .sum();
    let locals_length = checked.scope.next_offset;

    Ok(Method {
        is_public: unrolled.is_public,
        is_payable: unrolled.is_payable,
        args_length,
        locals_length,
        return_length,
        local_types: local_types_vec(&checked.scope, locals_length),
        instrs,
    })
}

fn check_stateless(methods: &[Method]) -> Result<(), CompileError> {
    for method in methods {
        for instr in &method.instrs {
            if instr.is_stateful_only() {
                return Err(CompileError::StatefulInstructionInStatelessScript(format!(
                    "{instr:?}"
                )));
            }
        }
    }
    Ok(())
}

/// Builds the shared cross-contract environment: every contract's callable
/// surface, keyed by its source-level type name, so compiling any one of
/// them can resolve an external call into another.
pub fn build_env(contracts: &[ContractDef]) -> Result<CompilerEnv, CompileError> {
    let mut interfaces = HashMap::new();
    for contract in contracts {
        interfaces.insert(contract.name.clone(), contract_interface(contract)?);
    }
    Ok(CompilerEnv { interfaces })
}

pub fn compile_contract(
    contract: &ContractDef,
    config: &CompilerConfig,
    env: &CompilerEnv,
) -> Result<(ContractId, StatefulContract), CompileError> {
    let _span = tracing::debug_span!("compile_contract", name = %contract.name, funcs = contract.funcs.len()).entered();
    let symbols = build_contract_symbols(contract)?;
    let field_names: HashMap<String, usize> = contract
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.clone(), i))
        .collect();
    let ctx = FuncContext::for_contract(&symbols, &field_names, env);
    let mut methods = Vec::with_capacity(contract.funcs.len());
    for func in &contract.funcs {
        methods.push(compile_method(func, config, &ctx)?);
    }
    let id = contract_id_for_name(&contract.name);
    let stateful = StatefulContract::new(symbols.field_length, methods)?;
    tracing::debug!(contract = %contract.name, ?id, "contract compiled");
    Ok((id, stateful))
}

pub fn compile_script_stateful(
    script: &ScriptDef,
    config: &CompilerConfig,
    env: &CompilerEnv,
) -> Result<StatefulScript, CompileError> {
    let _span = tracing::debug_span!("compile_script_stateful", funcs = script.funcs.len()).entered();
    let own_funcs = build_script_funcs(script)?;
    let ctx = FuncContext::for_script(&own_funcs, env);
    let mut methods = Vec::with_capacity(script.funcs.len());
    for func in &script.funcs {
        methods.push(compile_method(func, config, &ctx)?);
    }
    Ok(StatefulScript::new(methods)?)
}

/// A stateless script compiles the same way a stateful one does, but is
/// rejected if any method reaches for an asset/log instruction that only
/// makes sense with access to world state.
pub fn compile_script_stateless(
    script: &ScriptDef,
    config: &CompilerConfig,
    env: &CompilerEnv,
) -> Result<StatelessScript, CompileError> {
    let _span = tracing::debug_span!("compile_script_stateless", funcs = script.funcs.len()).entered();
    let own_funcs = build_script_funcs(script)?;
    let ctx = FuncContext::for_script(&own_funcs, env);
    let mut methods = Vec::with_capacity(script.funcs.len());
    for func in &script.funcs {
        methods.push(compile_method(func, config, &ctx)?);
    }
    check_stateless(&methods)?;
    Ok(StatelessScript::new(methods)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_lang::ast::{BinaryOp, Expr, ExprKind, FieldDef, Literal, NodeId, Param, Stmt, TypeName};
    use alephium_core::U256;

    fn counter_contract() -> ContractDef {
        ContractDef {
            name: "Counter".into(),
            fields: vec![FieldDef { name: "value".into(), ty: TypeName::U256, mutable: true }],
            events: vec![],
            funcs: vec![
                FuncDef {
                    name: "get".into(),
                    is_public: true,
                    is_payable: false,
                    params: vec![],
                    return_types: vec![TypeName::U256],
                    body: vec![Stmt::Return(vec![Expr {
                        id: NodeId(0),
                        kind: ExprKind::Variable("value".into()),
                    }])],
                },
                FuncDef {
                    name: "increment".into(),
                    is_public: true,
                    is_payable: false,
                    params: vec![],
                    return_types: vec![],
                    body: vec![Stmt::Assign {
                        targets: vec![alephium_lang::ast::AssignTarget::Ident("value".into())],
                        value: Expr {
                            id: NodeId(1),
                            kind: ExprKind::Binary(
                                BinaryOp::Add,
                                Box::new(Expr { id: NodeId(2), kind: ExprKind::Variable("value".into()) }),
                                Box::new(Expr {
                                    id: NodeId(3),
                                    kind: ExprKind::Const(Literal::U256(U256::from_u64(1))),
                                }),
                            ),
                        },
                    }],
                },
            ],
        }
    }

    #[test]
    fn counter_contract_compiles_to_two_methods() {
        let contract = counter_contract();
        let config = CompilerConfig::default();
        let env = build_env(&[contract.clone()]).unwrap();
        let (id, compiled) = compile_contract(&contract, &config, &env).unwrap();
        assert_eq!(compiled.field_length, 1);
        assert_eq!(compiled.methods.len(), 2);
        assert_eq!(id, contract_id_for_name("Counter"));
        assert_eq!(
            compiled.methods[0].instrs,
            vec![alephium_vm::instruction::Instruction::LoadField(0), alephium_vm::instruction::Instruction::Return]
        );
    }

    #[test]
    fn stateless_script_rejects_log_instruction() {
        let script = ScriptDef {
            funcs: vec![FuncDef {
                name: "main".into(),
                is_public: true,
                is_payable: false,
                params: vec![],
                return_types: vec![],
                body: vec![Stmt::EmitEvent { name: "Ev".into(), args: vec![] }],
            }],
        };
        let config = CompilerConfig::default();
        let env = CompilerEnv::default();
        // EmitEvent needs a contract's own event table; a bare script has
        // none, so this fails type checking before it ever reaches the
        // stateless-instruction check — which is exactly the point: a
        // script has no events to emit in the first place.
        assert!(matches!(
            compile_script_stateless(&script, &config, &env).unwrap_err(),
            CompileError::UnknownEvent(_)
        ));
    }

    #[test]
    fn param_count_index_is_stable_for_script_funcs() {
        let script = ScriptDef {
            funcs: vec![
                FuncDef {
                    name: "main".into(),
                    is_public: true,
                    is_payable: false,
                    params: vec![Param { name: "x".into(), ty: TypeName::U256 }],
                    return_types: vec![],
                    body: vec![],
                },
            ],
        };
        let config = CompilerConfig::default();
        let env = CompilerEnv::default();
        let compiled = compile_script_stateful(&script, &config, &env).unwrap();
        assert_eq!(compiled.entry_method().args_length, 1);
    }
}
