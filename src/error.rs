//! Errors this facade's own entry points can raise, on top of whatever the
//! pipeline stages underneath already define.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacadeError {
    #[error(transparent)]
    Parse(#[from] alephium_lang::error::ParseOrLexError),
    #[error(transparent)]
    Compile(#[from] alephium_compiler::CompileError),
    #[error("expected a contract definition, got a script")]
    ExpectedContract,
    #[error("expected a script definition, got a contract")]
    ExpectedScript,
}
