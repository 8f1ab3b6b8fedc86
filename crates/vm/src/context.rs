//! Execution contexts: the stateless capability every script runs with,
//! and the stateful capability that adds world-state staging, balances and
//! the contract pool.
//!
//! Instructions are generic over the capability they require (see
//! [`Instruction::is_stateful_only`](crate::instruction::Instruction::is_stateful_only));
//! the engine rejects a stateful-only instruction against a stateless
//! context before it ever reaches dispatch.

use crate::error::{ExecutionError, IOError, VmError, VmResult};
use crate::method::Method;
use crate::value::{ContractId, Value};
use alephium_core::{Address, U256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    pub chain_id: u32,
    pub timestamp: u64,
    pub difficulty_target: u64,
    pub hard_fork_identifier: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutput {
    pub lockup_script: Address,
    pub alf_amount: U256,
    pub tokens: Vec<(U256, U256)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEnv {
    pub tx_id: [u8; 32],
    pub prev_outputs: Vec<AssetOutput>,
    pub signature_stack: Vec<[u8; 64]>,
}

/// Every capability shared by stateless and stateful execution: the
/// block/tx environment and the gas meter.
///
/// The asset and external-call operations below default to a failure a
/// [`StatelessContext`] can never clear — the compiler never emits them in
/// a plain `TxScript` body, only in a contract method or a payable script,
/// both of which always run with a [`StatefulContext`].
pub trait Capability {
    fn block_env(&self) -> &BlockEnv;
    fn tx_env(&self) -> &TxEnv;
    fn gas_remaining(&self) -> u64;

    /// Deducts `cost` from the remaining gas budget. Every instruction must
    /// call this before mutating any state; failing to do so is a VM bug,
    /// not a contract-level failure.
    fn charge_gas(&mut self, cost: u64) -> Result<(), ExecutionError>;

    fn approve_alf(&mut self, lockup_script: Address, amount: U256) -> VmResult<()> {
        let _ = (lockup_script, amount);
        Err(VmError::Execution(ExecutionError::ExpectPayableMethod))
    }

    fn transfer_alf(&mut self, from: Address, to: Address, amount: U256) -> VmResult<()> {
        let _ = (from, to, amount);
        Err(VmError::Execution(ExecutionError::ExpectPayableMethod))
    }

    fn use_contract_assets(&mut self, id: ContractId) -> VmResult<Address> {
        let _ = id;
        Err(VmError::Execution(ExecutionError::ExpectPayableMethod))
    }

    fn generate_output(&mut self, lockup_script: Address, amount: U256) -> VmResult<()> {
        let _ = (lockup_script, amount);
        Err(VmError::Execution(ExecutionError::ExpectPayableMethod))
    }

    fn emit_log(&mut self, event_id: std::sync::Arc<Vec<u8>>, fields: Vec<Value>) -> VmResult<()> {
        let _ = (event_id, fields);
        Err(VmError::Execution(ExecutionError::ExpectPayableMethod))
    }

    /// Resolves `methodIndex` on `id`'s deployed code for a `CallExternal`,
    /// returning the method to run and a handle onto the callee contract's
    /// field storage for the duration of the call.
    fn resolve_external_method(
        &mut self,
        id: ContractId,
        method_index: u16,
    ) -> VmResult<(Rc<Method>, Rc<RefCell<Vec<Value>>>)> {
        let _ = (id, method_index);
        Err(VmError::Execution(ExecutionError::ExpectPayableMethod))
    }
}

pub struct StatelessContext {
    pub block_env: BlockEnv,
    pub tx_env: TxEnv,
    pub gas_remaining: u64,
}

impl Capability for StatelessContext {
    fn block_env(&self) -> &BlockEnv {
        &self.block_env
    }

    fn tx_env(&self) -> &TxEnv {
        &self.tx_env
    }

    fn gas_remaining(&self) -> u64 {
        self.gas_remaining
    }

    fn charge_gas(&mut self, cost: u64) -> Result<(), ExecutionError> {
        charge(&mut self.gas_remaining, cost)
    }
}

fn charge(remaining: &mut u64, cost: u64) -> Result<(), ExecutionError> {
    if *remaining < cost {
        *remaining = 0;
        return Err(ExecutionError::OutOfGas);
    }
    *remaining -= cost;
    Ok(())
}

/// Per-execution asset-use state of a contract loaded into the pool. See
/// the invariant in [`ContractPool::check_all_flushed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    NotUsed,
    InUse,
    Flushed,
}

/// The per-execution cache of contracts currently loaded from world state,
/// tracking the asset state machine independently of how the backing
/// trie-based world state is implemented (see [`WorldStateView`]).
#[derive(Debug, Default)]
pub struct ContractPool {
    states: HashMap<ContractId, AssetState>,
}

impl ContractPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(&self, id: ContractId) -> AssetState {
        *self.states.get(&id).unwrap_or(&AssetState::NotUsed)
    }

    pub fn use_contract_asset(&mut self, id: ContractId) -> Result<(), ExecutionError> {
        match self.state_of(id) {
            AssetState::NotUsed => {
                self.states.insert(id, AssetState::InUse);
                Ok(())
            }
            AssetState::InUse => Err(ExecutionError::ContractAssetAlreadyInUsing),
            AssetState::Flushed => Err(ExecutionError::ContractAssetAlreadyInUsing),
        }
    }

    /// Called when an output is generated against a contract whose asset
    /// is `InUse`, moving it to `Flushed`.
    pub fn flush(&mut self, id: ContractId) {
        if self.state_of(id) == AssetState::InUse {
            self.states.insert(id, AssetState::Flushed);
        }
    }

    pub fn remove(&mut self, id: ContractId) {
        self.states.remove(&id);
    }

    /// Invariant: no contract may end an execution `InUse`.
    pub fn check_all_flushed(&self) -> Result<(), ExecutionError> {
        if self.states.values().any(|s| *s == AssetState::InUse) {
            Err(ExecutionError::ContractAssetUnflushed)
        } else {
            Ok(())
        }
    }
}

/// Balance for one lockup script: ALF plus an arbitrary set of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancesPerLockup {
    pub alf_amount: U256,
    pub tokens: HashMap<[u8; 32], U256>,
}

impl BalancesPerLockup {
    pub fn checked_sub_alf(&mut self, amount: U256) -> Result<(), ExecutionError> {
        self.alf_amount = self
            .alf_amount
            .checked_sub(&amount)
            .map_err(|_| ExecutionError::InvalidBalances)?;
        Ok(())
    }

    pub fn checked_add_alf(&mut self, amount: U256) -> Result<(), ExecutionError> {
        self.alf_amount = self
            .alf_amount
            .checked_add(&amount)
            .map_err(|_| ExecutionError::InvalidBalances)?;
        Ok(())
    }

    pub fn checked_add_token(&mut self, token_id: [u8; 32], amount: U256) -> Result<(), ExecutionError> {
        let entry = self.tokens.entry(token_id).or_insert_with(U256::zero);
        *entry = entry.checked_add(&amount).map_err(|_| ExecutionError::InvalidBalances)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Balances {
    pub per_lockup: HashMap<Address, BalancesPerLockup>,
}

/// Backing store for contract state and the UTXO-like output set, as seen
/// by a single execution. Implemented by `alephium-state`'s staging world
/// state; the VM only ever sees this trait so it never depends on the
/// trie or persistence crates directly.
pub trait WorldStateView {
    type ContractHandle;

    fn get_contract(&mut self, id: ContractId) -> Result<Self::ContractHandle, IOError>;
    fn create_contract_unsafe(
        &mut self,
        code_hash: [u8; 32],
        state_hash: [u8; 32],
        fields: Vec<crate::value::Value>,
        output_ref: [u8; 32],
        contract_output: AssetOutput,
    ) -> Result<ContractId, IOError>;
    fn use_contract_asset(&mut self, id: ContractId) -> Result<([u8; 32], AssetOutput), IOError>;
    fn update_contract(
        &mut self,
        id: ContractId,
        output_ref: [u8; 32],
        output: AssetOutput,
    ) -> Result<(), IOError>;
    fn remove_contract(&mut self, id: ContractId) -> Result<(), IOError>;

    /// Reads the code hash a contract handle was deployed with, so the
    /// engine can fetch its compiled code for `CallExternal`.
    fn contract_code_hash(&self, handle: &Self::ContractHandle) -> [u8; 32];

    /// Reads a contract handle's current field values.
    fn contract_fields(&self, handle: &Self::ContractHandle) -> Vec<Value>;

    /// Fetches compiled code stored under `code_hash` by `storeCode`.
    fn get_code(&mut self, code_hash: [u8; 32]) -> Result<Vec<u8>, IOError>;
}

/// The richer capability stateful scripts and contract methods run with.
pub struct StatefulContext<W: WorldStateView> {
    pub stateless: StatelessContext,
    pub world_state: W,
    /// Funds a contract has approved for spending in this execution, via
    /// [`Capability::approve_alf`], keyed by the approving lockup script.
    pub approved_balances: Balances,
    /// Funds moved by `transferAlf`/`generateOutput`, ready to be turned
    /// into concrete outputs.
    pub output_balances: Balances,
    pub generated_outputs: Vec<AssetOutput>,
    pub contract_inputs: Vec<ContractId>,
    pub contract_pool: ContractPool,
    /// Maps a contract's own lockup script back to its id, populated by
    /// `useContractAssets`, so `generateOutput` knows which pool entry to
    /// flush.
    pub contract_addresses: HashMap<Address, ContractId>,
    /// Events recorded by `Log`, in emission order.
    pub emitted_logs: Vec<(std::sync::Arc<Vec<u8>>, Vec<Value>)>,
}

impl<W: WorldStateView> Capability for StatefulContext<W> {
    fn block_env(&self) -> &BlockEnv {
        self.stateless.block_env()
    }

    fn tx_env(&self) -> &TxEnv {
        self.stateless.tx_env()
    }

    fn gas_remaining(&self) -> u64 {
        self.stateless.gas_remaining()
    }

    fn charge_gas(&mut self, cost: u64) -> Result<(), ExecutionError> {
        self.stateless.charge_gas(cost)
    }

    fn approve_alf(&mut self, lockup_script: Address, amount: U256) -> VmResult<()> {
        self.output_balances
            .per_lockup
            .entry(lockup_script)
            .or_default()
            .checked_sub_alf(amount)
            .map_err(VmError::Execution)?;
        self.approved_balances
            .per_lockup
            .entry(lockup_script)
            .or_default()
            .checked_add_alf(amount)
            .map_err(VmError::Execution)?;
        Ok(())
    }

    fn transfer_alf(&mut self, from: Address, to: Address, amount: U256) -> VmResult<()> {
        self.approved_balances
            .per_lockup
            .entry(from)
            .or_default()
            .checked_sub_alf(amount)
            .map_err(VmError::Execution)?;
        self.output_balances
            .per_lockup
            .entry(to)
            .or_default()
            .checked_add_alf(amount)
            .map_err(VmError::Execution)?;
        Ok(())
    }

    fn use_contract_assets(&mut self, id: ContractId) -> VmResult<Address> {
        self.contract_pool.use_contract_asset(id).map_err(VmError::Execution)?;
        let (_, asset_output) = self.world_state.use_contract_asset(id)?;
        let lockup_script = asset_output.lockup_script;
        let bucket = self.output_balances.per_lockup.entry(lockup_script).or_default();
        bucket
            .checked_add_alf(asset_output.alf_amount)
            .map_err(VmError::Execution)?;
        for (token_id, token_amount) in asset_output.tokens {
            bucket
                .checked_add_token(token_id.to_big_endian_fixed(), token_amount)
                .map_err(VmError::Execution)?;
        }
        self.contract_addresses.insert(lockup_script, id);
        Ok(lockup_script)
    }

    fn generate_output(&mut self, lockup_script: Address, amount: U256) -> VmResult<()> {
        self.output_balances
            .per_lockup
            .entry(lockup_script)
            .or_default()
            .checked_sub_alf(amount)
            .map_err(VmError::Execution)?;
        self.generated_outputs.push(AssetOutput {
            lockup_script,
            alf_amount: amount,
            tokens: vec![],
        });
        if let Some(id) = self.contract_addresses.get(&lockup_script) {
            self.contract_pool.flush(*id);
        }
        Ok(())
    }

    fn emit_log(&mut self, event_id: std::sync::Arc<Vec<u8>>, fields: Vec<Value>) -> VmResult<()> {
        self.emitted_logs.push((event_id, fields));
        Ok(())
    }

    fn resolve_external_method(
        &mut self,
        id: ContractId,
        method_index: u16,
    ) -> VmResult<(Rc<Method>, Rc<RefCell<Vec<Value>>>)> {
        let handle = self.world_state.get_contract(id)?;
        let code_hash = self.world_state.contract_code_hash(&handle);
        let fields = self.world_state.contract_fields(&handle);
        let code_bytes = self.world_state.get_code(code_hash)?;
        let contract =
            <crate::method::StatefulContract as alephium_io::Serializable>::from_bytes(&code_bytes)
                .map_err(|e| IOError::LoadContract(format!("decoding contract code: {e}")))?;
        let method = contract
            .methods
            .get(method_index as usize)
            .cloned()
            .ok_or(VmError::Execution(ExecutionError::InvalidPc(method_index as i64)))?;
        Ok((Rc::new(method), Rc::new(RefCell::new(fields))))
    }
}

impl<W: WorldStateView> StatefulContext<W> {
    pub fn next_output_index(&self, fixed_outputs_len: usize) -> usize {
        fixed_outputs_len + self.generated_outputs.len()
    }

    /// Derives a deterministic output reference from the transaction id,
    /// the output and its index among fixed + generated outputs.
    pub fn next_contract_output_ref(&self, out: &AssetOutput, fixed_outputs_len: usize) -> [u8; 32] {
        let mut data = Vec::with_capacity(32 + 8 + 32);
        data.extend_from_slice(&self.stateless.tx_env.tx_id);
        data.extend_from_slice(&(self.next_output_index(fixed_outputs_len) as u64).to_le_bytes());
        data.extend_from_slice(out.lockup_script.as_bytes());
        alephium_cryptography::blake2b_256(&data)
    }

    /// Finalizes the contract pool's asset invariant. Call once, on every
    /// execution exit path including failure.
    pub fn finalize_asset_state(&self) -> Result<(), ExecutionError> {
        self.contract_pool.check_all_flushed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_pool_rejects_double_use() {
        let mut pool = ContractPool::new();
        let id = ContractId::from_bytes([1u8; 32]);
        pool.use_contract_asset(id).unwrap();
        assert_eq!(
            pool.use_contract_asset(id),
            Err(ExecutionError::ContractAssetAlreadyInUsing)
        );
    }

    #[test]
    fn contract_pool_flags_unflushed_asset_at_finalize() {
        let mut pool = ContractPool::new();
        let id = ContractId::from_bytes([2u8; 32]);
        pool.use_contract_asset(id).unwrap();
        assert_eq!(
            pool.check_all_flushed(),
            Err(ExecutionError::ContractAssetUnflushed)
        );
        pool.flush(id);
        assert_eq!(pool.check_all_flushed(), Ok(()));
    }

    #[test]
    fn charge_gas_exhausts_to_zero_on_out_of_gas() {
        let mut remaining = 5u64;
        assert_eq!(charge(&mut remaining, 10), Err(ExecutionError::OutOfGas));
        assert_eq!(remaining, 0);
    }
}
