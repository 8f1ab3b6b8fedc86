//! Error types shared across the value domain.

use thiserror::Error;

/// Errors raised by checked arithmetic on [`crate::U256`] and [`crate::I256`].
///
/// These surface to callers as `ExecutionError::ArithmeticError` (see the VM
/// error taxonomy); this crate only needs to describe what went wrong.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// An addition or multiplication exceeded the type's fixed width.
    #[error("arithmetic overflow")]
    Overflow,

    /// A subtraction produced a value below the type's representable range.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division or modulo with a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// A value could not be narrowed into the requested fixed width.
    #[error("value out of range")]
    OutOfRange,
}
