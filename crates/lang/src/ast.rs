//! The source-level AST. Nodes are immutable once parsed; the compiler's
//! type cache is a side table keyed by [`NodeId`], not an in-place mutation
//! of these nodes (see DESIGN.md).

use alephium_core::U256;
use std::sync::Arc;

/// A stable identity for an AST node, assigned by the parser in traversal
/// order. The compiler's type-checker memoizes `getType` results in a
/// `Map<NodeId, Type>` rather than mutating nodes in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    Bool,
    U256,
    I256,
    ByteVec,
    Address,
    Contract(String),
    Array(Box<TypeName>, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    U256(U256),
    ByteVec(Arc<Vec<u8>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(Literal),
    CreateArray(Vec<Expr>),
    /// Constant-index element access; the index expression must itself
    /// evaluate to a literal `U256` by the time the compiler reaches it.
    ArrayElement(Box<Expr>, Box<Expr>),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `ByteVec` address literal/expression reinterpreted as a contract
    /// handle.
    ContractConv(Box<Expr>),
    CallExpr(String, Vec<Expr>),
    ContractCallExpr(Box<Expr>, String, Vec<Expr>),
    Paren(Box<Expr>),
    /// Loop-unrolling index, legal only inside a `Loop` body; rejected if it
    /// ever reaches the emitter unsubstituted.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Ident(String),
    ArrayElement(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDef {
        bindings: Vec<(String, bool)>, // (name, mutable)
        value: Expr,
    },
    Assign {
        targets: Vec<AssignTarget>,
        value: Expr,
    },
    FuncCall(Expr),
    IfElse {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Return(Vec<Expr>),
    EmitEvent {
        name: String,
        args: Vec<Expr>,
    },
    Loop {
        start: Expr,
        end: Expr,
        step: Expr,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub is_public: bool,
    pub is_payable: bool,
    pub params: Vec<Param>,
    pub return_types: Vec<TypeName>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeName,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    pub name: String,
    pub fields: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub events: Vec<EventDef>,
    pub funcs: Vec<FuncDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDef {
    pub funcs: Vec<FuncDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Contract(ContractDef),
    Script(ScriptDef),
}
