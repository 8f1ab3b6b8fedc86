//! The dry-run transaction shape the emulator builds around a script: a
//! minimal `TransactionTemplate` carrying just enough of a real
//! transaction's surface to execute, padded with dummy signatures since
//! nothing here ever gets broadcast.

use alephium_config::EMULATOR_DUMMY_SIGNATURE_COUNT;
use alephium_core::U256;
use alephium_vm::AssetOutput;

/// One spent output, identified the same way a real input identifies it:
/// by the output reference it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxInput {
    pub output_ref: [u8; 32],
}

/// A transaction shaped only for dry-run execution: real fields
/// (signatures, network id, ...) that the VM never reads are either
/// omitted or padded with dummies sized for the worst case a real
/// transaction could present.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTemplate {
    pub tx_id: [u8; 32],
    pub inputs: Vec<TxInput>,
    pub fixed_outputs: Vec<AssetOutput>,
    /// The gas limit the caller asked to emulate against, or
    /// `alephium_config::MINIMAL_GAS` if none was supplied. Carried for
    /// reference only: the dry run itself always executes against a
    /// fresh `MAXIMAL_GAS_PER_TX` ceiling so its gas report is accurate
    /// even when this limit would have been too low.
    pub gas_amount: u64,
    pub gas_price: U256,
    pub input_signatures: Vec<[u8; 64]>,
    pub script_signatures: Vec<[u8; 64]>,
}

impl TransactionTemplate {
    pub fn dry_run(
        inputs: Vec<TxInput>,
        fixed_outputs: Vec<AssetOutput>,
        gas_amount: u64,
        gas_price: U256,
    ) -> Self {
        let tx_id = derive_dry_run_tx_id(&inputs, &fixed_outputs);
        Self {
            tx_id,
            inputs,
            fixed_outputs,
            gas_amount,
            gas_price,
            input_signatures: vec![[0u8; 64]; EMULATOR_DUMMY_SIGNATURE_COUNT],
            script_signatures: vec![[0u8; 64]; EMULATOR_DUMMY_SIGNATURE_COUNT],
        }
    }
}

/// A deterministic stand-in transaction id: hashes the inputs and fixed
/// outputs so repeated emulations of the same shape get the same id,
/// without needing the real transaction-hashing scheme a signed,
/// broadcastable transaction would use.
fn derive_dry_run_tx_id(inputs: &[TxInput], outputs: &[AssetOutput]) -> [u8; 32] {
    let mut data = Vec::with_capacity(32 * inputs.len() + 64 * outputs.len());
    for input in inputs {
        data.extend_from_slice(&input.output_ref);
    }
    for output in outputs {
        data.extend_from_slice(output.lockup_script.as_bytes());
        data.extend_from_slice(&output.alf_amount.to_big_endian_fixed());
    }
    alephium_cryptography::blake2b_256(&data)
}
