//! The dry-run entry point itself: assembles a throwaway `StatefulContext`
//! over a staged world state, runs a compiled script against it, and
//! reports what it would have cost without ever committing.

use crate::chain::{BlockFlowView, ChainIndex, GroupIndex};
use crate::error::EmulationError;
use crate::gas::check_code_size;
use crate::transaction::{TransactionTemplate, TxInput};
use alephium_config::{MAXIMAL_GAS_PER_TX, MINIMAL_GAS};
use alephium_core::U256;
use alephium_vm::method::StatefulScript;
use alephium_vm::{
    AssetOutput, Balances, Capability, ContractPool, ExecutionEngine, Method, StatefulContext,
    StatelessContext, TxEnv, Value,
};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// What one dry run against a staged world state returns: the script's
/// declared return values plus every side effect it would have produced,
/// had it actually run.
#[derive(Debug, Clone, PartialEq)]
pub struct TxScriptEmulationResult {
    pub gas_used: u64,
    pub return_values: Vec<Value>,
    pub generated_outputs: Vec<AssetOutput>,
    pub emitted_logs: Vec<(Arc<Vec<u8>>, Vec<Value>)>,
}

/// Dry-runs `script` against the chain state `chain` exposes, as if it
/// were submitted spending `inputs` and producing `fixed_outputs`. Never
/// commits: the world state it runs against is a staged overlay, cloned
/// from whatever the chain collaborator hands back, and discarded when
/// this returns.
pub fn emulate<B: BlockFlowView>(
    chain: &mut B,
    inputs: Vec<(TxInput, AssetOutput)>,
    fixed_outputs: Vec<AssetOutput>,
    script: &StatefulScript,
    gas_limit: Option<u64>,
    gas_price: Option<U256>,
) -> Result<TxScriptEmulationResult, EmulationError> {
    let _span = tracing::info_span!("emulate", inputs = inputs.len(), ?gas_limit).entered();
    let (first_input, _) = inputs.first().ok_or(EmulationError::NoInputs)?;
    let group_index = GroupIndex::from_output_ref(&first_input.output_ref);
    let chain_index = ChainIndex::intra_group(group_index);

    let block_env = chain
        .get_dryrun_block_env(chain_index)
        .map_err(|e| EmulationError::Chain(e.to_string()))?;
    let group_view = chain
        .get_mutable_group_view_including_pool(group_index)
        .map_err(|e| EmulationError::Chain(e.to_string()))?;

    let (tx_inputs, prev_outputs): (Vec<TxInput>, Vec<AssetOutput>) = inputs.into_iter().unzip();
    let template = TransactionTemplate::dry_run(
        tx_inputs,
        fixed_outputs,
        gas_limit.unwrap_or(MINIMAL_GAS),
        gas_price.unwrap_or_else(U256::one),
    );

    let gas_remaining =
        check_code_size(script).map_err(|e| EmulationError::Execution(e.to_string()))?;

    let mut output_balances = Balances::default();
    for output in &prev_outputs {
        let bucket = output_balances.per_lockup.entry(output.lockup_script).or_default();
        bucket
            .checked_add_alf(output.alf_amount.clone())
            .map_err(|e| EmulationError::Execution(e.to_string()))?;
        for (token_id, amount) in &output.tokens {
            bucket
                .checked_add_token(token_id.to_big_endian_fixed(), amount.clone())
                .map_err(|e| EmulationError::Execution(e.to_string()))?;
        }
    }

    let mut ctx = StatefulContext {
        stateless: StatelessContext {
            block_env,
            tx_env: TxEnv {
                tx_id: template.tx_id,
                prev_outputs,
                signature_stack: template.script_signatures.clone(),
            },
            gas_remaining,
        },
        world_state: group_view.staging(),
        approved_balances: Balances::default(),
        output_balances,
        generated_outputs: Vec::new(),
        contract_inputs: Vec::new(),
        contract_pool: ContractPool::new(),
        contract_addresses: HashMap::new(),
        emitted_logs: Vec::new(),
    };

    let methods: Rc<Vec<Rc<Method>>> =
        Rc::new(script.methods.iter().cloned().map(Rc::new).collect());
    let mut engine = ExecutionEngine::new();
    let return_values = engine
        .run(methods, 0, Vec::new(), &mut ctx)
        .map_err(EmulationError::from)?;
    ctx.finalize_asset_state()
        .map_err(|e| EmulationError::Execution(e.to_string()))?;

    let gas_used = MAXIMAL_GAS_PER_TX.saturating_sub(ctx.gas_remaining());
    tracing::info!(gas_used, outputs = ctx.generated_outputs.len(), "dry run completed");

    Ok(TxScriptEmulationResult {
        gas_used,
        return_values,
        generated_outputs: ctx.generated_outputs,
        emitted_logs: ctx.emitted_logs,
    })
}
