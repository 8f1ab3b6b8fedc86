//! Lexer, parser and AST for the contract source language (§4.5).
//!
//! This crate has no knowledge of types or code generation — it only turns
//! source text into an immutable [`ast::Unit`]. Type checking, symbol
//! resolution and emission live in `alephium-compiler`.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{ContractDef, ScriptDef, Unit};
pub use error::ParseOrLexError;
pub use parser::parse;
