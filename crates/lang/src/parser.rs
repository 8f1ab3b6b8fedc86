//! Recursive-descent parser with precedence climbing for binary operators.
//!
//! `CallExpr(name, args)` is emitted for every `name(args)` call site,
//! including what the type checker will later recognize as a `ContractConv`
//! (a call to a known contract type name with a single `ByteVec` argument).
//! Disambiguating the two needs the symbol table, so it is deferred to the
//! compiler rather than guessed here from naming convention.

use crate::ast::*;
use crate::error::ParseError;
use crate::token::Token;

pub struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    next_id: u32,
    loop_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<(Token, usize)>) -> Self {
        Self {
            tokens,
            pos: 0,
            next_id: 0,
            loop_depth: 0,
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].0.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, t: &Token) -> bool {
        self.peek() == t
    }

    fn eat(&mut self, t: &Token) -> Result<(), ParseError> {
        if self.check(t) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::Unexpected {
                expected: format!("{t:?}"),
                found: format!("{:?}", self.peek()),
            })
        }
    }

    fn eat_ident(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(ParseError::Unexpected {
                expected: "identifier".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    pub fn parse_unit(&mut self) -> Result<Unit, ParseError> {
        match self.peek().clone() {
            Token::TxContract => Ok(Unit::Contract(self.parse_contract()?)),
            Token::TxScript => Ok(Unit::Script(self.parse_script()?)),
            other => Err(ParseError::Unexpected {
                expected: "TxContract or TxScript".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_contract(&mut self) -> Result<ContractDef, ParseError> {
        self.eat(&Token::TxContract)?;
        let name = self.eat_ident()?;
        self.eat(&Token::LBrace)?;
        let mut fields = Vec::new();
        let mut events = Vec::new();
        let mut funcs = Vec::new();
        while !self.check(&Token::RBrace) {
            match self.peek() {
                Token::Let => fields.push(self.parse_field_decl()?),
                Token::Event => events.push(self.parse_event_decl()?),
                _ => funcs.push(self.parse_func_def()?),
            }
        }
        self.eat(&Token::RBrace)?;
        Ok(ContractDef {
            name,
            fields,
            events,
            funcs,
        })
    }

    fn parse_script(&mut self) -> Result<ScriptDef, ParseError> {
        self.eat(&Token::TxScript)?;
        self.eat(&Token::LBrace)?;
        let mut funcs = Vec::new();
        while !self.check(&Token::RBrace) {
            funcs.push(self.parse_func_def()?);
        }
        self.eat(&Token::RBrace)?;
        Ok(ScriptDef { funcs })
    }

    fn parse_field_decl(&mut self) -> Result<FieldDef, ParseError> {
        self.eat(&Token::Let)?;
        let mutable = if self.check(&Token::Mut) {
            self.advance();
            true
        } else {
            false
        };
        let name = self.eat_ident()?;
        self.eat(&Token::Colon)?;
        let ty = self.parse_type()?;
        self.eat(&Token::Semicolon)?;
        Ok(FieldDef { name, ty, mutable })
    }

    fn parse_event_decl(&mut self) -> Result<EventDef, ParseError> {
        self.eat(&Token::Event)?;
        let name = self.eat_ident()?;
        self.eat(&Token::LParen)?;
        let fields = self.parse_params()?;
        self.eat(&Token::RParen)?;
        self.eat(&Token::Semicolon)?;
        Ok(EventDef { name, fields })
    }

    fn parse_func_def(&mut self) -> Result<FuncDef, ParseError> {
        let is_public = if self.check(&Token::Pub) {
            self.advance();
            true
        } else {
            false
        };
        let is_payable = if self.check(&Token::Payable) {
            self.advance();
            true
        } else {
            false
        };
        self.eat(&Token::Fn)?;
        let name = self.eat_ident()?;
        self.eat(&Token::LParen)?;
        let params = self.parse_params()?;
        self.eat(&Token::RParen)?;
        let return_types = if self.check(&Token::Arrow) {
            self.advance();
            self.parse_return_types()?
        } else {
            Vec::new()
        };
        let body = self.parse_block()?;
        Ok(FuncDef {
            name,
            is_public,
            is_payable,
            params,
            return_types,
            body,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(params);
        }
        loop {
            let name = self.eat_ident()?;
            self.eat(&Token::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param { name, ty });
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(params)
    }

    fn parse_return_types(&mut self) -> Result<Vec<TypeName>, ParseError> {
        if self.check(&Token::LParen) {
            self.advance();
            let mut types = Vec::new();
            if !self.check(&Token::RParen) {
                loop {
                    types.push(self.parse_type()?);
                    if self.check(&Token::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.eat(&Token::RParen)?;
            Ok(types)
        } else {
            Ok(vec![self.parse_type()?])
        }
    }

    fn parse_type(&mut self) -> Result<TypeName, ParseError> {
        if self.check(&Token::LBracket) {
            self.advance();
            let base = self.parse_type()?;
            self.eat(&Token::Semicolon)?;
            let len_tok = self.advance();
            let len = match len_tok {
                Token::Number(v) => v.to_usize().ok_or(ParseError::NonConstantIndex)?,
                other => {
                    return Err(ParseError::Unexpected {
                        expected: "array length literal".into(),
                        found: format!("{other:?}"),
                    })
                }
            };
            self.eat(&Token::RBracket)?;
            return Ok(TypeName::Array(Box::new(base), len));
        }
        match self.advance() {
            Token::TyBool => Ok(TypeName::Bool),
            Token::TyU256 => Ok(TypeName::U256),
            Token::TyI256 => Ok(TypeName::I256),
            Token::TyByteVec => Ok(TypeName::ByteVec),
            Token::TyAddress => Ok(TypeName::Address),
            Token::Ident(name) => Ok(TypeName::Contract(name)),
            other => Err(ParseError::Unexpected {
                expected: "a type".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.eat(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.eat(&Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().clone() {
            Token::Let => self.parse_var_def(),
            Token::If => self.parse_if_else(),
            Token::While => self.parse_while(),
            Token::Loop => self.parse_loop(),
            Token::Return => self.parse_return(),
            Token::Emit => self.parse_emit(),
            _ => self.parse_assign_or_call(),
        }
    }

    fn parse_var_def(&mut self) -> Result<Stmt, ParseError> {
        self.eat(&Token::Let)?;
        let mut bindings = Vec::new();
        loop {
            let mutable = if self.check(&Token::Mut) {
                self.advance();
                true
            } else {
                false
            };
            let name = self.eat_ident()?;
            bindings.push((name, mutable));
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.eat(&Token::Assign)?;
        let value = self.parse_expr()?;
        self.eat(&Token::Semicolon)?;
        Ok(Stmt::VarDef { bindings, value })
    }

    fn parse_if_else(&mut self) -> Result<Stmt, ParseError> {
        self.eat(&Token::If)?;
        self.eat(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.eat(&Token::RParen)?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&Token::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::IfElse {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.eat(&Token::While)?;
        self.eat(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.eat(&Token::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_loop(&mut self) -> Result<Stmt, ParseError> {
        self.eat(&Token::Loop)?;
        self.eat(&Token::LParen)?;
        let start = self.parse_expr()?;
        self.eat(&Token::Comma)?;
        let end = self.parse_expr()?;
        self.eat(&Token::Comma)?;
        let step = self.parse_expr()?;
        self.eat(&Token::RParen)?;
        self.loop_depth += 1;
        let body = self.parse_block()?;
        self.loop_depth -= 1;
        Ok(Stmt::Loop {
            start,
            end,
            step,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.eat(&Token::Return)?;
        let mut values = Vec::new();
        if !self.check(&Token::Semicolon) {
            loop {
                values.push(self.parse_expr()?);
                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.eat(&Token::Semicolon)?;
        Ok(Stmt::Return(values))
    }

    fn parse_emit(&mut self) -> Result<Stmt, ParseError> {
        self.eat(&Token::Emit)?;
        let name = self.eat_ident()?;
        self.eat(&Token::LParen)?;
        let args = self.parse_args()?;
        self.eat(&Token::RParen)?;
        self.eat(&Token::Semicolon)?;
        Ok(Stmt::EmitEvent { name, args })
    }

    /// Disambiguates `Assign` from a bare call-expression statement by
    /// parsing a full expression first and checking what follows it.
    fn parse_assign_or_call(&mut self) -> Result<Stmt, ParseError> {
        let start_pos = self.pos;
        let first = self.parse_assign_target_candidate()?;
        if self.check(&Token::Assign) || self.check(&Token::Comma) {
            let mut targets = vec![first];
            while self.check(&Token::Comma) {
                self.advance();
                targets.push(self.parse_assign_target_candidate()?);
            }
            self.eat(&Token::Assign)?;
            let value = self.parse_expr()?;
            self.eat(&Token::Semicolon)?;
            return Ok(Stmt::Assign { targets, value });
        }
        // Not an assignment after all — re-parse as a plain expression
        // statement (covers bare calls like `token.transfer(x, y);`).
        self.pos = start_pos;
        let expr = self.parse_expr()?;
        self.eat(&Token::Semicolon)?;
        Ok(Stmt::FuncCall(expr))
    }

    fn parse_assign_target_candidate(&mut self) -> Result<AssignTarget, ParseError> {
        let name = self.eat_ident()?;
        let mut indices = Vec::new();
        while self.check(&Token::LBracket) {
            self.advance();
            indices.push(self.parse_expr()?);
            self.eat(&Token::RBracket)?;
        }
        if indices.is_empty() {
            Ok(AssignTarget::Ident(name))
        } else {
            Ok(AssignTarget::ArrayElement(name, indices))
        }
    }

    // --- Expressions, lowest to highest precedence ---

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.check(&Token::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = self.binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.check(&Token::AndAnd) {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = self.binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOp::Eq,
                Token::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Gt => BinaryOp::Gt,
                Token::Le => BinaryOp::Le,
                Token::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                let id = self.fresh_id();
                Ok(Expr {
                    id,
                    kind: ExprKind::Unary(UnaryOp::Neg, Box::new(operand)),
                })
            }
            Token::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                let id = self.fresh_id();
                Ok(Expr {
                    id,
                    kind: ExprKind::Unary(UnaryOp::Not, Box::new(operand)),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.eat(&Token::RBracket)?;
                    let id = self.fresh_id();
                    expr = Expr {
                        id,
                        kind: ExprKind::ArrayElement(Box::new(expr), Box::new(index)),
                    };
                }
                Token::Dot => {
                    self.advance();
                    let name = self.eat_ident()?;
                    self.eat(&Token::LParen)?;
                    let args = self.parse_args()?;
                    self.eat(&Token::RParen)?;
                    let id = self.fresh_id();
                    expr = Expr {
                        id,
                        kind: ExprKind::ContractCallExpr(Box::new(expr), name, args),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let id = self.fresh_id();
        match self.advance() {
            Token::Number(v) => Ok(Expr {
                id,
                kind: ExprKind::Const(Literal::U256(v)),
            }),
            Token::True => Ok(Expr {
                id,
                kind: ExprKind::Const(Literal::Bool(true)),
            }),
            Token::False => Ok(Expr {
                id,
                kind: ExprKind::Const(Literal::Bool(false)),
            }),
            Token::ByteVec(bytes) => Ok(Expr {
                id,
                kind: ExprKind::Const(Literal::ByteVec(bytes)),
            }),
            Token::Placeholder => {
                if self.loop_depth == 0 {
                    return Err(ParseError::PlaceholderOutsideLoop);
                }
                Ok(Expr {
                    id,
                    kind: ExprKind::Placeholder,
                })
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.eat(&Token::RParen)?;
                Ok(Expr {
                    id,
                    kind: ExprKind::Paren(Box::new(inner)),
                })
            }
            Token::LBracket => {
                let elements = self.parse_array_literal()?;
                Ok(Expr {
                    id,
                    kind: ExprKind::CreateArray(elements),
                })
            }
            Token::Ident(name) => {
                if self.check(&Token::LParen) {
                    self.advance();
                    let args = self.parse_args()?;
                    self.eat(&Token::RParen)?;
                    Ok(Expr {
                        id,
                        kind: ExprKind::CallExpr(name, args),
                    })
                } else {
                    Ok(Expr {
                        id,
                        kind: ExprKind::Variable(name),
                    })
                }
            }
            other => Err(ParseError::Unexpected {
                expected: "an expression".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut elements = Vec::new();
        if self.check(&Token::RBracket) {
            self.advance();
            return Ok(elements);
        }
        loop {
            elements.push(self.parse_expr()?);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.eat(&Token::RBracket)?;
        Ok(elements)
    }

    fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let id = self.fresh_id();
        Expr {
            id,
            kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
        }
    }
}

pub fn parse(src: &str) -> Result<Unit, crate::error::ParseOrLexError> {
    let _span = tracing::debug_span!("parse", source_len = src.len()).entered();
    let tokens = crate::lexer::lex(src).map_err(crate::error::ParseOrLexError::Lex)?;
    let unit = Parser::new(tokens)
        .parse_unit()
        .map_err(crate::error::ParseOrLexError::Parse)?;
    tracing::debug!("parsed source unit");
    Ok(unit)
}
