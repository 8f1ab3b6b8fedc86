//! Token domain produced by [`crate::lexer::lex`].

use alephium_core::U256;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(U256),
    True,
    False,
    ByteVec(Arc<Vec<u8>>),
    Ident(String),

    // Keywords
    TxContract,
    TxScript,
    AssetScript,
    Event,
    Fn,
    Let,
    Mut,
    If,
    Else,
    While,
    Loop,
    Return,
    Emit,
    Pub,
    Payable,

    // Type keywords
    TyBool,
    TyU256,
    TyI256,
    TyByteVec,
    TyAddress,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Arrow,
    Dot,
    Placeholder, // `$`, the loop-unrolling index

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

pub fn keyword(ident: &str) -> Option<Token> {
    Some(match ident {
        "TxContract" => Token::TxContract,
        "TxScript" => Token::TxScript,
        "AssetScript" => Token::AssetScript,
        "event" => Token::Event,
        "fn" => Token::Fn,
        "let" => Token::Let,
        "mut" => Token::Mut,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "loop" => Token::Loop,
        "return" => Token::Return,
        "emit" => Token::Emit,
        "pub" => Token::Pub,
        "payable" => Token::Payable,
        "true" => Token::True,
        "false" => Token::False,
        "Bool" => Token::TyBool,
        "U256" => Token::TyU256,
        "I256" => Token::TyI256,
        "ByteVec" => Token::TyByteVec,
        "Address" => Token::TyAddress,
        _ => return None,
    })
}
