//! Loop-unrolling AST rewrite. `Loop{start, end, step, body}` expands to
//! `floor((end-start)/step)` copies of `body` with [`Placeholder`]
//! substituted by `Const(U256(i))`.
//!
//! Bounds must all be literal `U256` constants — a documented simplifying
//! decision (see DESIGN.md): the source language has no constant-folding
//! story for arbitrary expressions, and every example this toolchain needs
//! to compile writes loop bounds as literals.

use crate::error::CompileError;
use alephium_core::U256;
use alephium_lang::ast::{AssignTarget, Expr, ExprKind, Literal, Stmt};

/// The highest `NodeId` used anywhere in `body`, or 0 if it contains no
/// expressions. Used to seed the fresh-id counter before unrolling so newly
/// cloned nodes never collide with ids the parser already assigned.
pub fn max_node_id_in_block(body: &[Stmt]) -> u32 {
    body.iter().map(max_node_id_in_stmt).max().unwrap_or(0)
}

fn max_node_id_in_expr(expr: &Expr) -> u32 {
    let child_max = match &expr.kind {
        ExprKind::Const(_) | ExprKind::Variable(_) | ExprKind::Placeholder => 0,
        ExprKind::CreateArray(items) => items.iter().map(max_node_id_in_expr).max().unwrap_or(0),
        ExprKind::ArrayElement(base, idx) => max_node_id_in_expr(base).max(max_node_id_in_expr(idx)),
        ExprKind::Unary(_, inner) | ExprKind::ContractConv(inner) | ExprKind::Paren(inner) => {
            max_node_id_in_expr(inner)
        }
        ExprKind::Binary(_, lhs, rhs) => max_node_id_in_expr(lhs).max(max_node_id_in_expr(rhs)),
        ExprKind::CallExpr(_, args) => args.iter().map(max_node_id_in_expr).max().unwrap_or(0),
        ExprKind::ContractCallExpr(receiver, _, args) => {
            max_node_id_in_expr(receiver).max(args.iter().map(max_node_id_in_expr).max().unwrap_or(0))
        }
    };
    expr.id.0.max(child_max)
}

fn max_node_id_in_stmt(stmt: &Stmt) -> u32 {
    match stmt {
        Stmt::VarDef { value, .. } => max_node_id_in_expr(value),
        Stmt::Assign { targets, value } => {
            let targets_max = targets
                .iter()
                .map(|t| match t {
                    AssignTarget::Ident(_) => 0,
                    AssignTarget::ArrayElement(_, idxs) => idxs.iter().map(max_node_id_in_expr).max().unwrap_or(0),
                })
                .max()
                .unwrap_or(0);
            targets_max.max(max_node_id_in_expr(value))
        }
        Stmt::FuncCall(expr) => max_node_id_in_expr(expr),
        Stmt::IfElse { cond, then_branch, else_branch } => {
            let mut m = max_node_id_in_expr(cond).max(max_node_id_in_block(then_branch));
            if let Some(else_branch) = else_branch {
                m = m.max(max_node_id_in_block(else_branch));
            }
            m
        }
        Stmt::While { cond, body } => max_node_id_in_expr(cond).max(max_node_id_in_block(body)),
        Stmt::Return(exprs) => exprs.iter().map(max_node_id_in_expr).max().unwrap_or(0),
        Stmt::EmitEvent { args, .. } => args.iter().map(max_node_id_in_expr).max().unwrap_or(0),
        Stmt::Loop { start, end, step, body } => max_node_id_in_expr(start)
            .max(max_node_id_in_expr(end))
            .max(max_node_id_in_expr(step))
            .max(max_node_id_in_block(body)),
    }
}

fn literal_u256(expr: &Expr) -> Option<U256> {
    match &expr.kind {
        ExprKind::Const(Literal::U256(v)) => Some(*v),
        ExprKind::Paren(inner) => literal_u256(inner),
        _ => None,
    }
}

fn check_loop_body_is_legal(body: &[Stmt]) -> Result<(), CompileError> {
    for stmt in body {
        match stmt {
            Stmt::Loop { .. } => return Err(CompileError::NestedLoop),
            Stmt::VarDef { .. } | Stmt::Return(_) => {
                return Err(CompileError::IllegalStatementInLoopBody)
            }
            Stmt::IfElse { then_branch, else_branch, .. } => {
                check_loop_body_is_legal(then_branch)?;
                if let Some(else_branch) = else_branch {
                    check_loop_body_is_legal(else_branch)?;
                }
            }
            Stmt::While { body, .. } => check_loop_body_is_legal(body)?,
            Stmt::Assign { .. } | Stmt::FuncCall(_) | Stmt::EmitEvent { .. } => {}
        }
    }
    Ok(())
}

fn fresh_id(next_id: &mut u32) -> alephium_lang::ast::NodeId {
    let id = alephium_lang::ast::NodeId(*next_id);
    *next_id += 1;
    id
}

fn instantiate_expr(expr: &Expr, index: U256, next_id: &mut u32) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Placeholder => ExprKind::Const(Literal::U256(index)),
        ExprKind::Const(lit) => ExprKind::Const(lit.clone()),
        ExprKind::Variable(name) => ExprKind::Variable(name.clone()),
        ExprKind::CreateArray(items) => {
            ExprKind::CreateArray(items.iter().map(|e| instantiate_expr(e, index, next_id)).collect())
        }
        ExprKind::ArrayElement(base, idx) => ExprKind::ArrayElement(
            Box::new(instantiate_expr(base, index, next_id)),
            Box::new(instantiate_expr(idx, index, next_id)),
        ),
        ExprKind::Unary(op, inner) => ExprKind::Unary(*op, Box::new(instantiate_expr(inner, index, next_id))),
        ExprKind::Binary(op, lhs, rhs) => ExprKind::Binary(
            *op,
            Box::new(instantiate_expr(lhs, index, next_id)),
            Box::new(instantiate_expr(rhs, index, next_id)),
        ),
        ExprKind::ContractConv(inner) => {
            ExprKind::ContractConv(Box::new(instantiate_expr(inner, index, next_id)))
        }
        ExprKind::CallExpr(name, args) => ExprKind::CallExpr(
            name.clone(),
            args.iter().map(|e| instantiate_expr(e, index, next_id)).collect(),
        ),
        ExprKind::ContractCallExpr(receiver, name, args) => ExprKind::ContractCallExpr(
            Box::new(instantiate_expr(receiver, index, next_id)),
            name.clone(),
            args.iter().map(|e| instantiate_expr(e, index, next_id)).collect(),
        ),
        ExprKind::Paren(inner) => ExprKind::Paren(Box::new(instantiate_expr(inner, index, next_id))),
    };
    Expr { id: fresh_id(next_id), kind }
}

fn instantiate_target(target: &AssignTarget, index: U256, next_id: &mut u32) -> AssignTarget {
    match target {
        AssignTarget::Ident(name) => AssignTarget::Ident(name.clone()),
        AssignTarget::ArrayElement(name, idxs) => AssignTarget::ArrayElement(
            name.clone(),
            idxs.iter().map(|e| instantiate_expr(e, index, next_id)).collect(),
        ),
    }
}

/// Deep-clones one loop-body statement for unrolled iteration `index`,
/// substituting `Placeholder` and assigning every cloned node a fresh id.
/// `VarDef`/`Return`/nested `Loop` never reach here: `unroll_block` rejects
/// them via [`check_loop_body_is_legal`] before instantiation begins.
fn instantiate_stmt(stmt: &Stmt, index: U256, next_id: &mut u32) -> Stmt {
    match stmt {
        Stmt::Assign { targets, value } => Stmt::Assign {
            targets: targets.iter().map(|t| instantiate_target(t, index, next_id)).collect(),
            value: instantiate_expr(value, index, next_id),
        },
        Stmt::FuncCall(expr) => Stmt::FuncCall(instantiate_expr(expr, index, next_id)),
        Stmt::IfElse { cond, then_branch, else_branch } => Stmt::IfElse {
            cond: instantiate_expr(cond, index, next_id),
            then_branch: then_branch.iter().map(|s| instantiate_stmt(s, index, next_id)).collect(),
            else_branch: else_branch
                .as_ref()
                .map(|b| b.iter().map(|s| instantiate_stmt(s, index, next_id)).collect()),
        },
        Stmt::While { cond, body } => Stmt::While {
            cond: instantiate_expr(cond, index, next_id),
            body: body.iter().map(|s| instantiate_stmt(s, index, next_id)).collect(),
        },
        Stmt::EmitEvent { name, args } => Stmt::EmitEvent {
            name: name.clone(),
            args: args.iter().map(|e| instantiate_expr(e, index, next_id)).collect(),
        },
        Stmt::VarDef { .. } | Stmt::Return(_) | Stmt::Loop { .. } => {
            unreachable!("rejected by check_loop_body_is_legal before unrolling")
        }
    }
}

/// Rewrites every `Loop` statement in `body` into its unrolled sequence of
/// sibling statements, recursing into `If`/`While` branches so loops nested
/// there (but not inside another loop) are unrolled too. `next_id` supplies
/// fresh `NodeId`s for cloned nodes so the type checker's per-node memo
/// table never sees two loop iterations sharing an id.
pub fn unroll_block(body: &[Stmt], limit: usize, next_id: &mut u32) -> Result<Vec<Stmt>, CompileError> {
    let mut out = Vec::with_capacity(body.len());
    for stmt in body {
        match stmt {
            Stmt::Loop { start, end, step, body } => {
                check_loop_body_is_legal(body)?;
                let start = literal_u256(start).ok_or(CompileError::NonConstantLoopBounds)?;
                let end = literal_u256(end).ok_or(CompileError::NonConstantLoopBounds)?;
                let step = literal_u256(step).ok_or(CompileError::NonConstantLoopBounds)?;
                if step.is_zero() {
                    return Err(CompileError::ZeroLoopStep);
                }
                let span = end.checked_sub(&start).map_err(|_| CompileError::NonConstantLoopBounds)?;
                let count = span
                    .checked_div(&step)
                    .map_err(|_| CompileError::ZeroLoopStep)?
                    .to_usize()
                    .ok_or(CompileError::LoopUnrollingLimitExceeded { unrolled: usize::MAX, limit })?;
                if count > limit {
                    return Err(CompileError::LoopUnrollingLimitExceeded { unrolled: count, limit });
                }
                let mut i = start;
                for _ in 0..count {
                    for s in body {
                        out.push(instantiate_stmt(s, i, next_id));
                    }
                    i = i.checked_add(&step).map_err(|_| CompileError::NonConstantLoopBounds)?;
                }
            }
            Stmt::IfElse { cond, then_branch, else_branch } => out.push(Stmt::IfElse {
                cond: cond.clone(),
                then_branch: unroll_block(then_branch, limit, next_id)?,
                else_branch: else_branch
                    .as_ref()
                    .map(|b| unroll_block(b, limit, next_id))
                    .transpose()?,
            }),
            Stmt::While { cond, body } => out.push(Stmt::While {
                cond: cond.clone(),
                body: unroll_block(body, limit, next_id)?,
            }),
            other => out.push(other.clone()),
        }
    }
    Ok(out)
}
