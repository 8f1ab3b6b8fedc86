//! Hand-written character scanner. No regex dependency — the token set is
//! small enough that a `match` over `char`s reads cleaner than a DFA table.

use crate::error::LexError;
use crate::token::{keyword, Token};
use alephium_core::U256;
use std::sync::Arc;

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            src,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().map(|c| c != '\n').unwrap_or(false) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .map(|c| c.is_alphanumeric() || c == '_')
            .unwrap_or(false)
        {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        keyword(&text).unwrap_or(Token::Ident(text))
    }

    fn number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            while self
                .peek()
                .map(|c| c.is_ascii_hexdigit())
                .unwrap_or(false)
            {
                self.advance();
            }
        } else {
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let value = text
            .parse::<U256>()
            .map_err(|_| LexError::InvalidNumber(text, start))?;
        Ok(Token::Number(value))
    }

    /// `#` followed by an even number of hex digits, e.g. `#deadbeef`.
    fn byte_vec(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.advance(); // consume '#'
        let hex_start = self.pos;
        while self
            .peek()
            .map(|c| c.is_ascii_hexdigit())
            .unwrap_or(false)
        {
            self.advance();
        }
        let text: String = self.chars[hex_start..self.pos].iter().collect();
        if text.is_empty() || text.len() % 2 != 0 {
            return Err(LexError::UnterminatedByteVec(start));
        }
        let bytes = hex::decode(&text).map_err(|_| LexError::UnterminatedByteVec(start))?;
        Ok(Token::ByteVec(Arc::new(bytes)))
    }

    pub fn tokenize(mut self) -> Result<Vec<(Token, usize)>, LexError> {
        let mut out = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                out.push((Token::Eof, self.src.len()));
                break;
            };
            let token = match c {
                '(' => { self.advance(); Token::LParen }
                ')' => { self.advance(); Token::RParen }
                '{' => { self.advance(); Token::LBrace }
                '}' => { self.advance(); Token::RBrace }
                '[' => { self.advance(); Token::LBracket }
                ']' => { self.advance(); Token::RBracket }
                ',' => { self.advance(); Token::Comma }
                ':' => { self.advance(); Token::Colon }
                ';' => { self.advance(); Token::Semicolon }
                '.' => { self.advance(); Token::Dot }
                '$' => { self.advance(); Token::Placeholder }
                '+' => { self.advance(); Token::Plus }
                '-' => {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        Token::Arrow
                    } else {
                        Token::Minus
                    }
                }
                '*' => { self.advance(); Token::Star }
                '/' => { self.advance(); Token::Slash }
                '%' => { self.advance(); Token::Percent }
                '!' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::Ne
                    } else {
                        Token::Bang
                    }
                }
                '=' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::Eq
                    } else {
                        Token::Assign
                    }
                }
                '<' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::Le
                    } else {
                        Token::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::Ge
                    } else {
                        Token::Gt
                    }
                }
                '&' if self.peek_at(1) == Some('&') => {
                    self.advance();
                    self.advance();
                    Token::AndAnd
                }
                '|' if self.peek_at(1) == Some('|') => {
                    self.advance();
                    self.advance();
                    Token::OrOr
                }
                '#' => self.byte_vec()?,
                c if c.is_ascii_digit() => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.ident_or_keyword(),
                other => return Err(LexError::UnexpectedChar(other, start)),
            };
            out.push((token, start));
        }
        Ok(out)
    }
}

pub fn lex(src: &str) -> Result<Vec<(Token, usize)>, LexError> {
    Lexer::new(src).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_function_signature() {
        let tokens = lex("pub fn add(a: U256, b: U256) -> U256 {}").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Pub,
                Token::Fn,
                Token::Ident("add".into()),
                Token::LParen,
                Token::Ident("a".into()),
                Token::Colon,
                Token::TyU256,
                Token::Comma,
                Token::Ident("b".into()),
                Token::Colon,
                Token::TyU256,
                Token::RParen,
                Token::Arrow,
                Token::TyU256,
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_byte_vec_and_number_literals() {
        let tokens = lex("#deadbeef 42").unwrap();
        assert_eq!(tokens[0].0, Token::ByteVec(std::sync::Arc::new(vec![0xde, 0xad, 0xbe, 0xef])));
        assert_eq!(tokens[1].0, Token::Number(U256::from_u64(42)));
    }

    #[test]
    fn rejects_odd_length_byte_vec() {
        assert!(matches!(lex("#abc"), Err(LexError::UnterminatedByteVec(_))));
    }

    #[test]
    fn line_comments_are_skipped() {
        let tokens = lex("1 // a comment\n+ 2").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![Token::Number(U256::from_u64(1)), Token::Plus, Token::Number(U256::from_u64(2)), Token::Eof]
        );
    }
}
