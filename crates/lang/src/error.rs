//! Lexer and parser failures. Both are surfaced synchronously and halt the
//! front end before the compiler ever sees an AST.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated byte-vector literal starting at offset {0}")]
    UnterminatedByteVec(usize),
    #[error("invalid numeric literal {0:?} at offset {1}")]
    InvalidNumber(String, usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseOrLexError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(String),
    #[error("expected {expected}, found {found:?}")]
    Unexpected { expected: String, found: String },
    #[error("array index must be a constant expression")]
    NonConstantIndex,
    #[error("placeholder `$` is only legal inside a loop body")]
    PlaceholderOutsideLoop,
}
