//! Thin facade over the contract toolchain: source text goes in, a
//! deployable `StatefulContract`/`StatefulScript`/`StatelessScript` comes
//! out, and the same artifact can be dry-run through `emulate` without
//! ever touching a real chain.
//!
//! Each crate underneath owns one stage of `source → parse → compile →
//! package → execute`:
//! - [`alephium_lang`] — lexer, parser, AST
//! - [`alephium_compiler`] — symbol resolution, type checking, loop
//!   unrolling, code emission, packaging
//! - [`alephium_vm`] — the stack machine and execution contexts
//! - [`alephium_state`] — the trie-backed world state behind
//!   `WorldStateView`
//! - [`alephium_emulator`] — gas-metered dry-run execution against a
//!   staged world state
//! - [`alephium_pruner`] — bloom-filter node garbage collection over the
//!   raw key-value store
//!
//! This crate doesn't add behavior of its own beyond gluing parse and
//! compile together per source unit; everything else is a re-export.

mod error;

pub use error::FacadeError;

pub use alephium_compiler::{
    build_env, compile_contract, compile_script_stateful, compile_script_stateless, CompileError,
    CompilerEnv,
};
pub use alephium_config::CompilerConfig;
pub use alephium_emulator::{
    emulate, BlockFlowView, ChainIndex, EmulationError, GroupIndex, TransactionTemplate, TxInput,
    TxScriptEmulationResult,
};
pub use alephium_lang::{parse, ContractDef, ScriptDef, Unit};
pub use alephium_state::{PersistedRoot, WorldState};
pub use alephium_vm::method::{StatefulContract, StatefulScript, StatelessScript};
pub use alephium_vm::value::ContractId;

use alephium_lang::ast::ContractDef as Contract;

/// Parses `src` as a single contract definition and compiles it against
/// `env`. `env` must already know about every contract this one calls
/// into — see [`build_env_from_sources`].
pub fn compile_contract_source(
    src: &str,
    config: &CompilerConfig,
    env: &CompilerEnv,
) -> Result<(ContractId, StatefulContract), FacadeError> {
    match parse(src)? {
        Unit::Contract(contract) => Ok(compile_contract(&contract, config, env)?),
        Unit::Script(_) => Err(FacadeError::ExpectedContract),
    }
}

/// Parses `src` as a single `TxScript` and compiles it as a stateful
/// script. Use [`compile_stateless_script_source`] when the script must
/// be rejected for reaching into asset or log instructions.
pub fn compile_script_source(
    src: &str,
    config: &CompilerConfig,
    env: &CompilerEnv,
) -> Result<StatefulScript, FacadeError> {
    match parse(src)? {
        Unit::Script(script) => Ok(compile_script_stateful(&script, config, env)?),
        Unit::Contract(_) => Err(FacadeError::ExpectedScript),
    }
}

/// Parses `src` as a single `TxScript` and compiles it as a stateless
/// script, rejecting it if any method reaches for a stateful-only
/// instruction.
pub fn compile_stateless_script_source(
    src: &str,
    config: &CompilerConfig,
    env: &CompilerEnv,
) -> Result<StatelessScript, FacadeError> {
    match parse(src)? {
        Unit::Script(script) => Ok(compile_script_stateless(&script, config, env)?),
        Unit::Contract(_) => Err(FacadeError::ExpectedScript),
    }
}

/// Parses every source unit that is a contract definition and builds the
/// shared [`CompilerEnv`] compiling any one of them needs to resolve
/// calls into the others. Script sources are silently skipped; compile
/// them individually with [`compile_script_source`].
pub fn build_env_from_sources(sources: &[&str]) -> Result<CompilerEnv, FacadeError> {
    let mut contracts: Vec<Contract> = Vec::new();
    for src in sources {
        if let Unit::Contract(contract) = parse(src)? {
            contracts.push(contract);
        }
    }
    Ok(build_env(&contracts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_contract_source_rejects_a_script_unit() {
        let src = "TxScript { pub fn main() {} }";
        let config = CompilerConfig::default();
        let env = CompilerEnv::default();
        assert!(matches!(
            compile_contract_source(src, &config, &env),
            Err(FacadeError::ExpectedContract)
        ));
    }

    #[test]
    fn compile_script_source_rejects_a_contract_unit() {
        let src = "TxContract Foo { pub fn get() -> U256 { return 0; } }";
        let config = CompilerConfig::default();
        let env = CompilerEnv::default();
        assert!(matches!(
            compile_script_source(src, &config, &env),
            Err(FacadeError::ExpectedScript)
        ));
    }
}
