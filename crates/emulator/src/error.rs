//! Flattens the VM's two-layer `{IOError | ExecutionError}` taxonomy into
//! a single human-readable error the emulator's caller can log or display
//! without matching on VM internals.

use alephium_vm::method::PackagingError;
use alephium_vm::VmError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmulationError {
    #[error("emulation requires at least one input")]
    NoInputs,
    #[error("failed to acquire chain state: {0}")]
    Chain(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error(transparent)]
    Packaging(#[from] PackagingError),
}

impl From<VmError> for EmulationError {
    fn from(err: VmError) -> Self {
        match err {
            VmError::Io(e) => EmulationError::Chain(e.to_string()),
            VmError::Execution(e) => EmulationError::Execution(e.to_string()),
        }
    }
}
