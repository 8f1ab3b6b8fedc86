//! Code emission: lowers a type-checked function body into the flat
//! `Vec<Instruction>` the engine executes.
//!
//! Two conventions drive every multi-slot load/store here: a value's
//! flattened slots are always pushed/loaded in ascending offset order
//! (mirroring how [`ExprKind::CreateArray`] pushes its items), and always
//! popped/stored in descending offset order, since the most recently pushed
//! slot sits on top of the operand stack.

use crate::error::CompileError;
use crate::symbol::VarOrigin;
use crate::typecheck::{eval_const_index, CheckedFunc, FuncContext};
use alephium_config::MAX_BRANCH_INSTRS;
use alephium_core::I256;
use alephium_lang::ast::{AssignTarget, BinaryOp, Expr, ExprKind, FuncDef, Literal, Stmt, UnaryOp};
use alephium_vm::instruction::Instruction;
use alephium_vm::value::Type;
use std::sync::Arc;

pub fn emit_function(
    func: &FuncDef,
    checked: &CheckedFunc,
    ctx: &FuncContext,
) -> Result<Vec<Instruction>, CompileError> {
    emit_block(&func.body, checked, ctx)
}

fn emit_block(
    body: &[Stmt],
    checked: &CheckedFunc,
    ctx: &FuncContext,
) -> Result<Vec<Instruction>, CompileError> {
    let mut out = Vec::new();
    for stmt in body {
        emit_stmt(stmt, checked, ctx, &mut out)?;
    }
    Ok(out)
}

fn check_branch_len(instrs: &[Instruction]) -> Result<(), CompileError> {
    if instrs.len() > MAX_BRANCH_INSTRS {
        return Err(CompileError::TooManyInstrsForBranch(instrs.len()));
    }
    Ok(())
}

fn node_type(checked: &CheckedFunc, expr: &Expr) -> Type {
    checked
        .types
        .get(&expr.id)
        .and_then(|tys| tys.first())
        .cloned()
        .unwrap_or(Type::U256)
}

fn node_flattened_len(checked: &CheckedFunc, expr: &Expr) -> usize {
    checked
        .types
        .get(&expr.id)
        .map(|tys| tys.iter().map(Type::flattened_len).sum())
        .unwrap_or(0)
}

fn load_instr(origin: VarOrigin, offset: usize) -> Instruction {
    match origin {
        VarOrigin::Local => Instruction::LoadLocal(offset as u16),
        VarOrigin::Field => Instruction::LoadField(offset as u16),
    }
}

fn store_instr(origin: VarOrigin, offset: usize) -> Instruction {
    match origin {
        VarOrigin::Local => Instruction::StoreLocal(offset as u16),
        VarOrigin::Field => Instruction::StoreField(offset as u16),
    }
}

fn emit_load_value(origin: VarOrigin, offset: usize, len: usize, out: &mut Vec<Instruction>) {
    for i in 0..len {
        out.push(load_instr(origin, offset + i));
    }
}

fn emit_store_value(origin: VarOrigin, offset: usize, len: usize, out: &mut Vec<Instruction>) {
    for i in (0..len).rev() {
        out.push(store_instr(origin, offset + i));
    }
}

/// Resolves the flattened slot an lvalue-shaped expression (a variable or a
/// chain of constant-index array accesses on one) refers to.
fn resolve_location(
    expr: &Expr,
    checked: &CheckedFunc,
    ctx: &FuncContext,
) -> Result<(VarOrigin, usize, Type), CompileError> {
    match &expr.kind {
        ExprKind::Paren(inner) => resolve_location(inner, checked, ctx),
        ExprKind::Variable(name) => {
            let slot = checked
                .scope
                .lookup(name, ctx.fields, ctx.field_names)
                .ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            Ok((slot.origin, slot.offset, slot.ty.clone()))
        }
        ExprKind::ArrayElement(base, idx) => {
            let (origin, base_offset, base_ty) = resolve_location(base, checked, ctx)?;
            let idx_val = eval_const_index(idx)? as usize;
            match base_ty {
                Type::FixedSizeArray(elem, _) => {
                    let elem_len = elem.flattened_len();
                    Ok((origin, base_offset + idx_val * elem_len, *elem))
                }
                _ => Err(CompileError::NotAnArray),
            }
        }
        _ => Err(CompileError::NotAnArray),
    }
}

fn resolve_assign_location(
    target: &AssignTarget,
    checked: &CheckedFunc,
    ctx: &FuncContext,
) -> Result<(VarOrigin, usize, Type), CompileError> {
    match target {
        AssignTarget::Ident(name) => {
            let slot = checked
                .scope
                .lookup(name, ctx.fields, ctx.field_names)
                .ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            Ok((slot.origin, slot.offset, slot.ty.clone()))
        }
        AssignTarget::ArrayElement(name, idxs) => {
            let slot = checked
                .scope
                .lookup(name, ctx.fields, ctx.field_names)
                .ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            let mut offset = slot.offset;
            let mut ty = slot.ty.clone();
            for idx in idxs {
                let idx_val = eval_const_index(idx)? as usize;
                match ty {
                    Type::FixedSizeArray(elem, _) => {
                        offset += idx_val * elem.flattened_len();
                        ty = *elem;
                    }
                    _ => return Err(CompileError::NotAnArray),
                }
            }
            Ok((slot.origin, offset, ty))
        }
    }
}

fn binary_instr(op: BinaryOp, ty: &Type) -> Instruction {
    use BinaryOp::*;
    match (op, ty) {
        (Add, Type::U256) => Instruction::AddU256,
        (Add, Type::I256) => Instruction::AddI256,
        (Sub, Type::U256) => Instruction::SubU256,
        (Sub, Type::I256) => Instruction::SubI256,
        (Mul, Type::U256) => Instruction::MulU256,
        (Mul, Type::I256) => Instruction::MulI256,
        (Div, Type::U256) => Instruction::DivU256,
        (Div, Type::I256) => Instruction::DivI256,
        (Mod, Type::U256) => Instruction::ModU256,
        (Mod, Type::I256) => Instruction::ModI256,
        (Eq, _) | (Ne, _) => Instruction::EqU256,
        (Lt, _) => Instruction::LtU256,
        (Gt, _) => Instruction::GtU256,
        (Le, _) => Instruction::LeU256,
        (Ge, _) => Instruction::GeU256,
        (And, _) => Instruction::And,
        (Or, _) => Instruction::Or,
        _ => unreachable!("type checking already rejected this operator/operand combination"),
    }
}

fn emit_expr(
    expr: &Expr,
    checked: &CheckedFunc,
    ctx: &FuncContext,
    out: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    match &expr.kind {
        ExprKind::Const(lit) => {
            out.push(match lit {
                Literal::Bool(b) => Instruction::ConstBool(*b),
                Literal::U256(v) => Instruction::ConstU256(*v),
                Literal::ByteVec(v) => Instruction::ConstByteVec(v.clone()),
            });
            Ok(())
        }
        ExprKind::Placeholder => {
            unreachable!("Placeholder never survives loop unrolling into the emitter")
        }
        ExprKind::Paren(inner) => emit_expr(inner, checked, ctx, out),
        ExprKind::Variable(name) => {
            let slot = checked
                .scope
                .lookup(name, ctx.fields, ctx.field_names)
                .ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            emit_load_value(slot.origin, slot.offset, slot.ty.flattened_len(), out);
            Ok(())
        }
        ExprKind::CreateArray(items) => {
            for item in items {
                emit_expr(item, checked, ctx, out)?;
            }
            Ok(())
        }
        ExprKind::ArrayElement(..) => {
            let (origin, offset, ty) = resolve_location(expr, checked, ctx)?;
            emit_load_value(origin, offset, ty.flattened_len(), out);
            Ok(())
        }
        ExprKind::Unary(UnaryOp::Not, inner) => {
            emit_expr(inner, checked, ctx, out)?;
            out.push(Instruction::Not);
            Ok(())
        }
        ExprKind::Unary(UnaryOp::Neg, inner) => {
            // No dedicated negate opcode exists; synthesize `0 - x`. Type
            // checking restricts this to I256 operands.
            out.push(Instruction::ConstI256(I256::zero()));
            emit_expr(inner, checked, ctx, out)?;
            out.push(Instruction::SubI256);
            Ok(())
        }
        ExprKind::Binary(op, lhs, rhs) => {
            emit_expr(lhs, checked, ctx, out)?;
            emit_expr(rhs, checked, ctx, out)?;
            let lhs_ty = node_type(checked, lhs);
            out.push(binary_instr(*op, &lhs_ty));
            if matches!(op, BinaryOp::Ne) {
                out.push(Instruction::Not);
            }
            Ok(())
        }
        ExprKind::ContractConv(inner) => {
            emit_expr(inner, checked, ctx, out)?;
            out.push(Instruction::ContractConv);
            Ok(())
        }
        ExprKind::CallExpr(name, args) => {
            if let Some(sig) = ctx.own_funcs.get(name) {
                for arg in args {
                    emit_expr(arg, checked, ctx, out)?;
                }
                out.push(Instruction::CallLocal(sig.index as u16));
            } else {
                // Not a known local function: the parser defers
                // contract-type-conversion disambiguation to here, same as
                // in type checking.
                emit_expr(&args[0], checked, ctx, out)?;
                out.push(Instruction::ContractConv);
            }
            Ok(())
        }
        ExprKind::ContractCallExpr(receiver, method, args) => {
            for arg in args {
                emit_expr(arg, checked, ctx, out)?;
            }
            emit_expr(receiver, checked, ctx, out)?;
            let receiver_name = match &receiver.kind {
                ExprKind::Variable(name) => Some(name.clone()),
                _ => None,
            };
            let type_name_hint = receiver_name
                .as_ref()
                .and_then(|name| checked.scope.lookup(name, ctx.fields, ctx.field_names))
                .and_then(|slot| slot.contract_type_name.clone());
            let iface = type_name_hint
                .as_ref()
                .and_then(|n| ctx.env.interfaces.get(n))
                .ok_or_else(|| {
                    CompileError::UnknownContractType(type_name_hint.clone().unwrap_or_default())
                })?;
            let sig = iface
                .funcs
                .get(method)
                .ok_or_else(|| CompileError::UnknownFunction(method.clone()))?;
            out.push(Instruction::CallExternal(sig.index as u16));
            Ok(())
        }
    }
}

fn emit_var_def(
    bindings: &[(String, bool)],
    value: &Expr,
    checked: &CheckedFunc,
    ctx: &FuncContext,
    out: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    let value_types = checked.types.get(&value.id).cloned().unwrap_or_default();
    emit_expr(value, checked, ctx, out)?;
    for (ty, (name, _mutable)) in value_types.iter().zip(bindings.iter()).rev() {
        let slot = checked
            .scope
            .vars
            .get(name)
            .ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
        emit_store_value(slot.origin, slot.offset, ty.flattened_len(), out);
    }
    Ok(())
}

fn emit_assign(
    targets: &[AssignTarget],
    value: &Expr,
    checked: &CheckedFunc,
    ctx: &FuncContext,
    out: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    let value_types = checked.types.get(&value.id).cloned().unwrap_or_default();
    emit_expr(value, checked, ctx, out)?;
    for (ty, target) in value_types.iter().zip(targets.iter()).rev() {
        let (origin, offset, _ty) = resolve_assign_location(target, checked, ctx)?;
        emit_store_value(origin, offset, ty.flattened_len(), out);
    }
    Ok(())
}

fn emit_if_else(
    cond: &Expr,
    then_branch: &[Stmt],
    else_branch: &Option<Vec<Stmt>>,
    checked: &CheckedFunc,
    ctx: &FuncContext,
    out: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    emit_expr(cond, checked, ctx, out)?;
    let then_instrs = emit_block(then_branch, checked, ctx)?;
    check_branch_len(&then_instrs)?;
    match else_branch {
        None => {
            out.push(Instruction::IfFalse(then_instrs.len() as i32));
            out.extend(then_instrs);
        }
        Some(else_branch) => {
            let else_instrs = emit_block(else_branch, checked, ctx)?;
            check_branch_len(&else_instrs)?;
            out.push(Instruction::IfFalse(then_instrs.len() as i32 + 1));
            out.extend(then_instrs);
            out.push(Instruction::Jump(else_instrs.len() as i32));
            out.extend(else_instrs);
        }
    }
    Ok(())
}

fn emit_while(
    cond: &Expr,
    body: &[Stmt],
    checked: &CheckedFunc,
    ctx: &FuncContext,
    out: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    let mut cond_instrs = Vec::new();
    emit_expr(cond, checked, ctx, &mut cond_instrs)?;
    let body_instrs = emit_block(body, checked, ctx)?;
    check_branch_len(&body_instrs)?;
    let cond_len = cond_instrs.len() as i32;
    let body_len = body_instrs.len() as i32;
    out.extend(cond_instrs);
    out.push(Instruction::IfFalse(body_len + 1));
    out.extend(body_instrs);
    // Jump back to the start of `cond` so it is re-evaluated every
    // iteration; the offset is relative to the instruction after this one.
    out.push(Instruction::Jump(-(cond_len + body_len + 2)));
    Ok(())
}

fn emit_stmt(
    stmt: &Stmt,
    checked: &CheckedFunc,
    ctx: &FuncContext,
    out: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    match stmt {
        Stmt::VarDef { bindings, value } => emit_var_def(bindings, value, checked, ctx, out),
        Stmt::Assign { targets, value } => emit_assign(targets, value, checked, ctx, out),
        Stmt::FuncCall(expr) => {
            emit_expr(expr, checked, ctx, out)?;
            for _ in 0..node_flattened_len(checked, expr) {
                out.push(Instruction::Pop);
            }
            Ok(())
        }
        Stmt::IfElse { cond, then_branch, else_branch } => {
            emit_if_else(cond, then_branch, else_branch, checked, ctx, out)
        }
        Stmt::While { cond, body } => emit_while(cond, body, checked, ctx, out),
        Stmt::Return(exprs) => {
            for e in exprs {
                emit_expr(e, checked, ctx, out)?;
            }
            out.push(Instruction::Return);
            Ok(())
        }
        Stmt::EmitEvent { name, args } => {
            let event = ctx
                .own_events
                .get(name)
                .ok_or_else(|| CompileError::UnknownEvent(name.clone()))?;
            let mut field_count = 0usize;
            for a in args {
                emit_expr(a, checked, ctx, out)?;
                field_count += node_flattened_len(checked, a);
            }
            out.push(Instruction::Log {
                field_count: field_count as u8,
                event_id: Arc::new(event.event_id.clone()),
            });
            Ok(())
        }
        Stmt::Loop { .. } => unreachable!("loops are rewritten away before emission"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{build_script_funcs, CompilerEnv};
    use crate::typecheck::check_function;
    use alephium_lang::ast::{FuncDef, Literal, NodeId, Param, ScriptDef, TypeName};
    use alephium_core::U256;
    use std::collections::HashMap;

    fn add_two_func() -> FuncDef {
        FuncDef {
            name: "add".into(),
            is_public: true,
            is_payable: false,
            params: vec![
                Param { name: "a".into(), ty: TypeName::U256 },
                Param { name: "b".into(), ty: TypeName::U256 },
            ],
            return_types: vec![TypeName::U256],
            body: vec![Stmt::Return(vec![Expr {
                id: NodeId(0),
                kind: ExprKind::Binary(
                    BinaryOp::Add,
                    Box::new(Expr { id: NodeId(1), kind: ExprKind::Variable("a".into()) }),
                    Box::new(Expr { id: NodeId(2), kind: ExprKind::Variable("b".into()) }),
                ),
            }])],
        }
    }

    #[test]
    fn add_two_emits_loads_add_and_return() {
        let func = add_two_func();
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        let instrs = emit_function(&func, &checked, &fctx).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::LoadLocal(0),
                Instruction::LoadLocal(1),
                Instruction::AddU256,
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn if_without_else_emits_a_single_conditional_skip() {
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![Param { name: "a".into(), ty: TypeName::Bool }],
            return_types: vec![],
            body: vec![Stmt::IfElse {
                cond: Expr { id: NodeId(0), kind: ExprKind::Variable("a".into()) },
                then_branch: vec![Stmt::Return(vec![])],
                else_branch: None,
            }],
        };
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        let instrs = emit_function(&func, &checked, &fctx).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::LoadLocal(0),
                Instruction::IfFalse(1),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn while_loop_jumps_back_to_recheck_condition() {
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![Param { name: "a".into(), ty: TypeName::Bool }],
            return_types: vec![],
            body: vec![Stmt::While {
                cond: Expr { id: NodeId(0), kind: ExprKind::Variable("a".into()) },
                body: vec![Stmt::FuncCall(Expr {
                    id: NodeId(1),
                    kind: ExprKind::CallExpr("noop".into(), vec![]),
                })],
            }],
        };
        let mut own_funcs = HashMap::new();
        own_funcs.insert(
            "noop".into(),
            crate::symbol::FuncSig {
                index: 0,
                is_public: false,
                is_payable: false,
                params: vec![],
                returns: vec![],
            },
        );
        let env = CompilerEnv::default();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        let instrs = emit_function(&func, &checked, &fctx).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::LoadLocal(0),
                Instruction::IfFalse(2),
                Instruction::CallLocal(0),
                Instruction::Jump(-4),
            ]
        );
    }

    #[test]
    fn unused_call_result_is_popped() {
        let mut own_funcs = HashMap::new();
        own_funcs.insert(
            "one".into(),
            crate::symbol::FuncSig {
                index: 0,
                is_public: false,
                is_payable: false,
                params: vec![],
                returns: vec![Type::U256],
            },
        );
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![],
            return_types: vec![],
            body: vec![Stmt::FuncCall(Expr {
                id: NodeId(0),
                kind: ExprKind::CallExpr("one".into(), vec![]),
            })],
        };
        let env = CompilerEnv::default();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        let instrs = emit_function(&func, &checked, &fctx).unwrap();
        assert_eq!(instrs, vec![Instruction::CallLocal(0), Instruction::Pop]);
    }

    #[test]
    fn neg_is_synthesized_as_zero_minus_x() {
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![Param { name: "a".into(), ty: TypeName::I256 }],
            return_types: vec![TypeName::I256],
            body: vec![Stmt::Return(vec![Expr {
                id: NodeId(0),
                kind: ExprKind::Unary(
                    UnaryOp::Neg,
                    Box::new(Expr { id: NodeId(1), kind: ExprKind::Variable("a".into()) }),
                ),
            }])],
        };
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        let instrs = emit_function(&func, &checked, &fctx).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::ConstI256(I256::zero()),
                Instruction::LoadLocal(0),
                Instruction::SubI256,
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn array_literal_is_stored_in_descending_offset_order() {
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![],
            return_types: vec![],
            body: vec![Stmt::VarDef {
                bindings: vec![("arr".into(), false)],
                value: Expr {
                    id: NodeId(0),
                    kind: ExprKind::CreateArray(vec![
                        Expr { id: NodeId(1), kind: ExprKind::Const(Literal::U256(U256::from_u64(1))) },
                        Expr { id: NodeId(2), kind: ExprKind::Const(Literal::U256(U256::from_u64(2))) },
                    ]),
                },
            }],
        };
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        let instrs = emit_function(&func, &checked, &fctx).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::ConstU256(U256::from_u64(1)),
                Instruction::ConstU256(U256::from_u64(2)),
                Instruction::StoreLocal(1),
                Instruction::StoreLocal(0),
            ]
        );
    }

    #[test]
    fn branch_too_long_fails_compilation() {
        let body: Vec<Stmt> = (0..300)
            .map(|i| Stmt::FuncCall(Expr { id: NodeId(i), kind: ExprKind::CallExpr("noop".into(), vec![]) }))
            .collect();
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![Param { name: "a".into(), ty: TypeName::Bool }],
            return_types: vec![],
            body: vec![Stmt::IfElse {
                cond: Expr { id: NodeId(1000), kind: ExprKind::Variable("a".into()) },
                then_branch: body,
                else_branch: None,
            }],
        };
        let mut own_funcs = HashMap::new();
        own_funcs.insert(
            "noop".into(),
            crate::symbol::FuncSig { index: 0, is_public: false, is_payable: false, params: vec![], returns: vec![] },
        );
        let env = CompilerEnv::default();
        let fctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &fctx).unwrap();
        assert!(matches!(
            emit_function(&func, &checked, &fctx).unwrap_err(),
            CompileError::TooManyInstrsForBranch(_)
        ));
    }

    #[test]
    fn script_funcs_are_built_in_declaration_order() {
        let script = ScriptDef { funcs: vec![add_two_func()] };
        let funcs = build_script_funcs(&script).unwrap();
        assert_eq!(funcs.get("add").unwrap().index, 0);
    }
}
