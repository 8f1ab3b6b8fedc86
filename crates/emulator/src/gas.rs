//! The code-size gas charge applied before a dry run ever steps the
//! engine, independent of whatever gas limit the caller supplied.

use alephium_config::MAXIMAL_GAS_PER_TX;
use alephium_io::Serializable;
use alephium_vm::method::StatefulScript;
use alephium_vm::ExecutionError;

/// Gas charged per byte of a script's compiled, serialized form.
const GAS_PER_CODE_BYTE: u64 = 1;

/// Charges `script`'s size against a fresh `MAXIMAL_GAS_PER_TX` budget and
/// returns what's left of it. The dry run continues spending from this
/// same remaining budget rather than resetting, so the final gas report
/// reflects both the code-size charge and the execution itself.
pub fn check_code_size(script: &StatefulScript) -> Result<u64, ExecutionError> {
    let code_size_bytes = script.to_bytes().len() as u64;
    let cost = code_size_bytes.saturating_mul(GAS_PER_CODE_BYTE);
    MAXIMAL_GAS_PER_TX
        .checked_sub(cost)
        .ok_or(ExecutionError::OutOfGas)
}
