//! Symbol resolution, type checking, array flattening, loop unrolling and
//! code emission: turns a parsed [`alephium_lang::ast::Unit`] into the
//! runtime artifacts `alephium-vm` executes.
//!
//! A single function body passes through, in order: [`unroll`] (rewrites
//! bounded `Loop`s into their unrolled sibling statements), [`typecheck`]
//! (a memoized per-node type pass) and [`emit`] (stack-machine code
//! generation). [`compile`] drives all three per function and packages the
//! result with `alephium_vm::method`'s constructors.

pub mod compile;
pub mod emit;
pub mod error;
pub mod symbol;
pub mod typecheck;
pub mod unroll;

pub use compile::{build_env, compile_contract, compile_script_stateful, compile_script_stateless};
pub use error::CompileError;
pub use symbol::CompilerEnv;
