//! Type checking: a memoized, per-AST-node pass that runs after loop
//! unrolling and before emission.
//!
//! Each expression's type(s) are computed once and cached in a
//! `HashMap<NodeId, Vec<Type>>` side table rather than mutating the (shared,
//! immutable) AST nodes in place, per the cyclic-sharing note in the spec's
//! design notes.

use crate::error::CompileError;
use crate::symbol::{
    contract_type_name, resolve_type, CompilerEnv, ContractSymbols, EventSig, FuncSig, LocalScope,
    VarOrigin, VarSlot,
};
use alephium_lang::ast::{
    AssignTarget, BinaryOp, Expr, ExprKind, FuncDef, Literal, NodeId, Stmt, UnaryOp,
};
use alephium_vm::value::Type;
use std::collections::HashMap;

/// Resolves a compile-time-constant array index. Supports the arithmetic a
/// loop-unrolled index expression like `i*2+1` reduces to once `Placeholder`
/// has been substituted: literals and `+`/`-`/`*` combinations of them.
pub fn eval_const_index(expr: &Expr) -> Result<u64, CompileError> {
    match &expr.kind {
        ExprKind::Const(Literal::U256(v)) => v.to_u64().ok_or(CompileError::NonConstantIndex),
        ExprKind::Paren(inner) => eval_const_index(inner),
        ExprKind::Binary(op, lhs, rhs) => {
            let l = eval_const_index(lhs)?;
            let r = eval_const_index(rhs)?;
            match op {
                BinaryOp::Add => Ok(l + r),
                BinaryOp::Sub => l.checked_sub(r).ok_or(CompileError::NonConstantIndex),
                BinaryOp::Mul => Ok(l * r),
                _ => Err(CompileError::NonConstantIndex),
            }
        }
        _ => Err(CompileError::NonConstantIndex),
    }
}

fn type_name(ty: &Type) -> String {
    format!("{ty:?}")
}

fn expect_single(tys: Vec<Type>) -> Result<Type, CompileError> {
    if tys.len() != 1 {
        return Err(CompileError::TypeMismatch {
            expected: "a single value".into(),
            got: format!("{} values", tys.len()),
        });
    }
    Ok(tys.into_iter().next().unwrap())
}

/// Everything a function body's type check needs about the contract or
/// script it lives in.
pub struct FuncContext<'a> {
    pub fields: &'a [VarSlot],
    pub field_names: &'a HashMap<String, usize>,
    pub own_funcs: &'a HashMap<String, FuncSig>,
    pub own_events: &'a HashMap<String, EventSig>,
    pub env: &'a CompilerEnv,
}

impl<'a> FuncContext<'a> {
    pub fn for_contract(symbols: &'a ContractSymbols, field_names: &'a HashMap<String, usize>, env: &'a CompilerEnv) -> Self {
        Self {
            fields: &symbols.field_slots,
            field_names,
            own_funcs: &symbols.funcs,
            own_events: &symbols.events,
            env,
        }
    }

    pub fn for_script(own_funcs: &'a HashMap<String, FuncSig>, env: &'a CompilerEnv) -> Self {
        Self {
            fields: &[],
            field_names: empty_field_names(),
            own_funcs,
            own_events: empty_events(),
            env,
        }
    }
}

fn empty_field_names() -> &'static HashMap<String, usize> {
    static EMPTY: std::sync::OnceLock<HashMap<String, usize>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

fn empty_events() -> &'static HashMap<String, EventSig> {
    static EMPTY: std::sync::OnceLock<HashMap<String, EventSig>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

/// The result of type-checking one function body: its local scope (with
/// flattened slot offsets, needed again at emission) and the memoized
/// per-node type table.
pub struct CheckedFunc {
    pub scope: LocalScope,
    pub types: HashMap<NodeId, Vec<Type>>,
}

pub fn check_function(func: &FuncDef, ctx: &FuncContext) -> Result<CheckedFunc, CompileError> {
    let mut scope = LocalScope::new();
    for param in &func.params {
        scope.declare_param(&param.name, resolve_type(&param.ty), contract_type_name(&param.ty));
    }
    let mut types = HashMap::new();
    for stmt in &func.body {
        check_stmt(stmt, &mut scope, ctx, &mut types, func)?;
    }
    Ok(CheckedFunc { scope, types })
}

fn lookup_var<'a>(name: &str, scope: &'a LocalScope, ctx: &'a FuncContext) -> Option<&'a VarSlot> {
    scope.lookup(name, ctx.fields, ctx.field_names)
}

fn check_stmt(
    stmt: &Stmt,
    scope: &mut LocalScope,
    ctx: &FuncContext,
    types: &mut HashMap<NodeId, Vec<Type>>,
    func: &FuncDef,
) -> Result<(), CompileError> {
    match stmt {
        Stmt::VarDef { bindings, value } => {
            let value_types = check_expr(value, scope, ctx, types)?;
            if value_types.len() != bindings.len() {
                return Err(CompileError::ArgCountMismatch {
                    name: "variable binding".into(),
                    expected: bindings.len(),
                    got: value_types.len(),
                });
            }
            for ((name, mutable), ty) in bindings.iter().zip(value_types) {
                scope.declare_local(name, ty, *mutable);
            }
            Ok(())
        }
        Stmt::Assign { targets, value } => {
            let value_types = check_expr(value, scope, ctx, types)?;
            if value_types.len() != targets.len() {
                return Err(CompileError::ArgCountMismatch {
                    name: "assignment".into(),
                    expected: targets.len(),
                    got: value_types.len(),
                });
            }
            for (target, ty) in targets.iter().zip(value_types) {
                check_assign_target(target, &ty, scope, ctx, types)?;
            }
            Ok(())
        }
        Stmt::FuncCall(expr) => {
            check_expr(expr, scope, ctx, types)?;
            Ok(())
        }
        Stmt::IfElse { cond, then_branch, else_branch } => {
            let cond_ty = expect_single(check_expr(cond, scope, ctx, types)?)?;
            if cond_ty != Type::Bool {
                return Err(CompileError::NonBoolCondition(type_name(&cond_ty)));
            }
            for s in then_branch {
                check_stmt(s, scope, ctx, types, func)?;
            }
            if let Some(else_branch) = else_branch {
                for s in else_branch {
                    check_stmt(s, scope, ctx, types, func)?;
                }
            }
            Ok(())
        }
        Stmt::While { cond, body } => {
            let cond_ty = expect_single(check_expr(cond, scope, ctx, types)?)?;
            if cond_ty != Type::Bool {
                return Err(CompileError::NonBoolCondition(type_name(&cond_ty)));
            }
            for s in body {
                check_stmt(s, scope, ctx, types, func)?;
            }
            Ok(())
        }
        Stmt::Return(exprs) => {
            let expected: Vec<Type> = func.return_types.iter().map(resolve_type).collect();
            let mut got = Vec::with_capacity(exprs.len());
            for e in exprs {
                got.extend(check_expr(e, scope, ctx, types)?);
            }
            if got != expected {
                return Err(CompileError::ReturnArityMismatch(expected.len()));
            }
            Ok(())
        }
        Stmt::EmitEvent { name, args } => {
            let event = ctx
                .own_events
                .get(name)
                .ok_or_else(|| CompileError::UnknownEvent(name.clone()))?;
            let mut got = Vec::with_capacity(args.len());
            for a in args {
                got.extend(check_expr(a, scope, ctx, types)?);
            }
            if got != event.field_types {
                return Err(CompileError::ArgCountMismatch {
                    name: name.clone(),
                    expected: event.field_types.len(),
                    got: got.len(),
                });
            }
            Ok(())
        }
        Stmt::Loop { .. } => unreachable!("loops are rewritten away before type checking"),
    }
}

fn check_assign_target(
    target: &AssignTarget,
    value_ty: &Type,
    scope: &LocalScope,
    ctx: &FuncContext,
    types: &mut HashMap<NodeId, Vec<Type>>,
) -> Result<(), CompileError> {
    match target {
        AssignTarget::Ident(name) => {
            let slot = lookup_var(name, scope, ctx).ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            if !slot.mutable {
                return Err(CompileError::AssignToImmutable(name.clone()));
            }
            if &slot.ty != value_ty {
                return Err(CompileError::TypeMismatch {
                    expected: type_name(&slot.ty),
                    got: type_name(value_ty),
                });
            }
            Ok(())
        }
        AssignTarget::ArrayElement(name, idxs) => {
            let slot = lookup_var(name, scope, ctx).ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            if !slot.mutable {
                return Err(CompileError::AssignToImmutable(name.clone()));
            }
            let mut base = &slot.ty;
            for idx in idxs {
                let idx_types = check_expr(idx, scope, ctx, types)?;
                if expect_single(idx_types)? != Type::U256 {
                    return Err(CompileError::NonConstantIndex);
                }
                eval_const_index(idx)?;
                match base {
                    Type::FixedSizeArray(elem, _) => base = elem,
                    _ => return Err(CompileError::NotAnArray),
                }
            }
            if base != value_ty {
                return Err(CompileError::TypeMismatch {
                    expected: type_name(base),
                    got: type_name(value_ty),
                });
            }
            Ok(())
        }
    }
}

/// Recursively computes (and memoizes) an expression's type(s).
pub fn check_expr(
    expr: &Expr,
    scope: &LocalScope,
    ctx: &FuncContext,
    types: &mut HashMap<NodeId, Vec<Type>>,
) -> Result<Vec<Type>, CompileError> {
    if let Some(cached) = types.get(&expr.id) {
        return Ok(cached.clone());
    }
    let result = check_expr_uncached(expr, scope, ctx, types)?;
    types.insert(expr.id, result.clone());
    Ok(result)
}

fn check_expr_uncached(
    expr: &Expr,
    scope: &LocalScope,
    ctx: &FuncContext,
    types: &mut HashMap<NodeId, Vec<Type>>,
) -> Result<Vec<Type>, CompileError> {
    match &expr.kind {
        ExprKind::Const(lit) => Ok(vec![match lit {
            Literal::Bool(_) => Type::Bool,
            Literal::U256(_) => Type::U256,
            Literal::ByteVec(_) => Type::ByteVec,
        }]),
        ExprKind::Placeholder => {
            unreachable!("Placeholder never survives loop unrolling into the type checker")
        }
        ExprKind::Paren(inner) => check_expr(inner, scope, ctx, types),
        ExprKind::Variable(name) => {
            let slot = lookup_var(name, scope, ctx).ok_or_else(|| CompileError::UnknownIdent(name.clone()))?;
            Ok(vec![slot.ty.clone()])
        }
        ExprKind::CreateArray(items) => {
            if items.is_empty() {
                return Err(CompileError::InhomogeneousArray);
            }
            let mut elem_ty = None;
            for item in items {
                let ty = expect_single(check_expr(item, scope, ctx, types)?)?;
                match &elem_ty {
                    None => elem_ty = Some(ty),
                    Some(expected) if *expected != ty => return Err(CompileError::InhomogeneousArray),
                    Some(_) => {}
                }
            }
            Ok(vec![Type::FixedSizeArray(Box::new(elem_ty.unwrap()), items.len())])
        }
        ExprKind::ArrayElement(base, idx) => {
            let base_ty = expect_single(check_expr(base, scope, ctx, types)?)?;
            let idx_ty = expect_single(check_expr(idx, scope, ctx, types)?)?;
            if idx_ty != Type::U256 {
                return Err(CompileError::TypeMismatch {
                    expected: "U256".into(),
                    got: type_name(&idx_ty),
                });
            }
            eval_const_index(idx)?;
            match base_ty {
                Type::FixedSizeArray(elem, _) => Ok(vec![*elem]),
                _ => Err(CompileError::NotAnArray),
            }
        }
        ExprKind::Unary(op, inner) => {
            let ty = expect_single(check_expr(inner, scope, ctx, types)?)?;
            match (op, &ty) {
                (UnaryOp::Not, Type::Bool) => Ok(vec![Type::Bool]),
                (UnaryOp::Neg, Type::I256) => Ok(vec![Type::I256]),
                _ => Err(CompileError::TypeMismatch {
                    expected: "an operand matching this unary operator".into(),
                    got: type_name(&ty),
                }),
            }
        }
        ExprKind::Binary(op, lhs, rhs) => {
            let lhs_ty = expect_single(check_expr(lhs, scope, ctx, types)?)?;
            let rhs_ty = expect_single(check_expr(rhs, scope, ctx, types)?)?;
            if lhs_ty != rhs_ty {
                return Err(CompileError::TypeMismatch {
                    expected: type_name(&lhs_ty),
                    got: type_name(&rhs_ty),
                });
            }
            use BinaryOp::*;
            match op {
                Add | Sub | Mul | Div | Mod => match lhs_ty {
                    Type::U256 | Type::I256 => Ok(vec![lhs_ty]),
                    _ => Err(CompileError::TypeMismatch {
                        expected: "U256 or I256".into(),
                        got: type_name(&lhs_ty),
                    }),
                },
                Eq | Ne | Lt | Gt | Le | Ge => match lhs_ty {
                    Type::U256 => Ok(vec![Type::Bool]),
                    _ => Err(CompileError::TypeMismatch {
                        expected: "U256".into(),
                        got: type_name(&lhs_ty),
                    }),
                },
                And | Or => match lhs_ty {
                    Type::Bool => Ok(vec![Type::Bool]),
                    _ => Err(CompileError::TypeMismatch {
                        expected: "Bool".into(),
                        got: type_name(&lhs_ty),
                    }),
                },
            }
        }
        ExprKind::ContractConv(_) => {
            // The parser never constructs this variant directly: a
            // `Name(byteVecExpr)` call site is parsed as `CallExpr` and
            // disambiguated below, since only the symbol table (not the
            // grammar) can tell a contract-type conversion from an ordinary
            // function call. The AST node exists for completeness but has
            // no reachable construction path from source text.
            Err(CompileError::UnknownFunction("<ContractConv>".into()))
        }
        ExprKind::CallExpr(name, args) => {
            if let Some(sig) = ctx.own_funcs.get(name) {
                check_call_args(name, args, &sig.params, scope, ctx, types)?;
                return Ok(sig.returns.clone());
            }
            // Not a known function: per the parser's deferred disambiguation,
            // this is a `ContractConv`-shaped call — a single ByteVec
            // argument naming the target contract type by identifier.
            if args.len() != 1 {
                return Err(CompileError::ArgCountMismatch {
                    name: name.clone(),
                    expected: 1,
                    got: args.len(),
                });
            }
            let arg_ty = expect_single(check_expr(&args[0], scope, ctx, types)?)?;
            if arg_ty != Type::ByteVec {
                return Err(CompileError::TypeMismatch {
                    expected: "ByteVec".into(),
                    got: type_name(&arg_ty),
                });
            }
            Ok(vec![Type::Contract(crate::symbol::contract_id_for_name(name))])
        }
        ExprKind::ContractCallExpr(receiver, method, args) => {
            let receiver_name = match &receiver.kind {
                ExprKind::Variable(name) => Some(name.clone()),
                _ => None,
            };
            let type_name_hint = receiver_name
                .as_ref()
                .and_then(|name| lookup_var(name, scope, ctx))
                .and_then(|slot| slot.contract_type_name.clone());
            check_expr(receiver, scope, ctx, types)?;
            let iface = type_name_hint
                .as_ref()
                .and_then(|n| ctx.env.interfaces.get(n))
                .ok_or_else(|| CompileError::UnknownContractType(type_name_hint.clone().unwrap_or_default()))?;
            let sig = iface
                .funcs
                .get(method)
                .ok_or_else(|| CompileError::UnknownFunction(method.clone()))?;
            check_call_args(method, args, &sig.params, scope, ctx, types)?;
            Ok(sig.returns.clone())
        }
    }
}

fn check_call_args(
    name: &str,
    args: &[Expr],
    params: &[Type],
    scope: &LocalScope,
    ctx: &FuncContext,
    types: &mut HashMap<NodeId, Vec<Type>>,
) -> Result<(), CompileError> {
    if args.len() != params.len() {
        return Err(CompileError::ArgCountMismatch {
            name: name.to_string(),
            expected: params.len(),
            got: args.len(),
        });
    }
    for (arg, expected) in args.iter().zip(params) {
        let got = expect_single(check_expr(arg, scope, ctx, types)?)?;
        if &got != expected {
            return Err(CompileError::TypeMismatch {
                expected: type_name(expected),
                got: type_name(&got),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::build_contract_symbols;
    use alephium_lang::ast::{ContractDef, FieldDef, Param, TypeName};
    use alephium_core::U256;

    fn num(n: u64) -> Expr {
        Expr { id: NodeId(100 + n as u32), kind: ExprKind::Const(Literal::U256(U256::from_u64(n))) }
    }

    #[test]
    fn add_two_params_type_checks_to_u256() {
        let func = FuncDef {
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
        };
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let ctx = FuncContext::for_script(&own_funcs, &env);
        let checked = check_function(&func, &ctx).unwrap();
        assert_eq!(checked.types.get(&NodeId(0)), Some(&vec![Type::U256]));
    }

    #[test]
    fn condition_must_be_bool() {
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![],
            return_types: vec![],
            body: vec![Stmt::IfElse {
                cond: num(1),
                then_branch: vec![],
                else_branch: None,
            }],
        };
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let ctx = FuncContext::for_script(&own_funcs, &env);
        assert!(matches!(
            check_function(&func, &ctx).unwrap_err(),
            CompileError::NonBoolCondition(_)
        ));
    }

    #[test]
    fn assigning_to_an_immutable_field_fails() {
        let contract = ContractDef {
            name: "C".into(),
            fields: vec![FieldDef { name: "x".into(), ty: TypeName::U256, mutable: false }],
            events: vec![],
            funcs: vec![],
        };
        let symbols = build_contract_symbols(&contract).unwrap();
        let field_names: HashMap<String, usize> = symbols
            .field_slots
            .iter()
            .enumerate()
            .map(|(i, _)| ("x".to_string(), i))
            .collect();
        let env = CompilerEnv::default();
        let ctx = FuncContext::for_contract(&symbols, &field_names, &env);
        let scope = LocalScope::new();
        let mut types = HashMap::new();
        let target = AssignTarget::Ident("x".into());
        let err = check_assign_target(&target, &Type::U256, &scope, &ctx, &mut types).unwrap_err();
        assert_eq!(err, CompileError::AssignToImmutable("x".into()));
    }

    #[test]
    fn unknown_identifier_fails() {
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![],
            return_types: vec![TypeName::U256],
            body: vec![Stmt::Return(vec![Expr { id: NodeId(0), kind: ExprKind::Variable("ghost".into()) }])],
        };
        let env = CompilerEnv::default();
        let own_funcs = HashMap::new();
        let ctx = FuncContext::for_script(&own_funcs, &env);
        assert_eq!(
            check_function(&func, &ctx).unwrap_err(),
            CompileError::UnknownIdent("ghost".into())
        );
    }
}
