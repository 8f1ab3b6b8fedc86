//! Compile-time failures. All are surfaced synchronously and halt
//! compilation before any method reaches packaging.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("duplicate function name {0:?}")]
    DuplicateFunction(String),
    #[error("duplicate event name {0:?}")]
    DuplicateEvent(String),
    #[error("duplicate field name {0:?}")]
    DuplicateField(String),
    #[error("unknown identifier {0:?}")]
    UnknownIdent(String),
    #[error("unknown function {0:?}")]
    UnknownFunction(String),
    #[error("unknown contract type {0:?}")]
    UnknownContractType(String),
    #[error("unknown event {0:?}")]
    UnknownEvent(String),
    #[error("{name:?} expects {expected} argument(s), got {got}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("cannot assign to immutable variable {0:?}")]
    AssignToImmutable(String),
    #[error("condition must be a single Bool, got {0}")]
    NonBoolCondition(String),
    #[error("a return statement must yield exactly the function's declared {0} return value(s)")]
    ReturnArityMismatch(usize),
    #[error("array index must be a compile-time constant")]
    NonConstantIndex,
    #[error("array index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: u64, length: usize },
    #[error("indexing into a non-array value")]
    NotAnArray,
    #[error("array literal elements are not all the same type")]
    InhomogeneousArray,
    #[error("a loop's start/end/step must all be compile-time constant U256 literals")]
    NonConstantLoopBounds,
    #[error("loop step must not be zero")]
    ZeroLoopStep,
    #[error("unrolling this loop would produce {unrolled} iterations, exceeding the limit of {limit}")]
    LoopUnrollingLimitExceeded { unrolled: usize, limit: usize },
    #[error("loop bodies may not contain nested loops")]
    NestedLoop,
    #[error("loop bodies may not contain variable declarations or return statements")]
    IllegalStatementInLoopBody,
    #[error("too many instructions for branch ({0} exceeds the single-byte jump limit)")]
    TooManyInstrsForBranch(usize),
    #[error("a stateless script may not use the stateful-only instruction {0:?}")]
    StatefulInstructionInStatelessScript(String),
    #[error(transparent)]
    Packaging(#[from] alephium_vm::method::PackagingError),
    #[error(transparent)]
    Parse(#[from] alephium_lang::error::ParseOrLexError),
}
