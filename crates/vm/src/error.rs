//! The two-level error taxonomy every VM step returns through.
//!
//! [`IOError`] and [`ExecutionError`] are orthogonal: an IO error means the
//! world state is indeterminate and the transaction must be aborted without
//! commit, while an execution error is ordinary contract-level failure that
//! still consumes gas up to the failing instruction.

use alephium_core::ArithmeticError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IOError {
    #[error("failed to load contract {0}")]
    LoadContract(String),
    #[error("failed to load outputs")]
    LoadOutputs,
    #[error("failed to update world state")]
    UpdateState,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("operand stack overflow")]
    StackOverflow,
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("execution ran out of gas")]
    OutOfGas,
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
    #[error("invalid opcode at pc {0}")]
    InvalidOpcode(usize),
    #[error("invalid program counter {0}")]
    InvalidPc(i64),
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("invalid transaction input index {0}")]
    InvalidTxInputIndex(usize),
    #[error("referenced transaction input does not exist")]
    NonExistTxInput,
    #[error("method is payable but was invoked as non-payable")]
    ExpectNonPayableMethod,
    #[error("method is non-payable but was invoked as payable")]
    ExpectPayableMethod,
    #[error("balances are invalid")]
    InvalidBalances,
    #[error("unable to pay the gas fee from the first input")]
    UnableToPayGasFee,
    #[error("invalid address type in contract destroy")]
    InvalidAddressTypeInContractDestroy,
    #[error("a contract asset was left in use when execution completed")]
    ContractAssetUnflushed,
    #[error("contract asset is already in use")]
    ContractAssetAlreadyInUsing,
    #[error("call depth exceeded the frame stack capacity")]
    CallDepthExceeded,
}

/// The two-level result every instruction and context operation returns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error(transparent)]
    Io(#[from] IOError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub type VmResult<T> = std::result::Result<T, VmError>;
