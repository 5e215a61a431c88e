//! Formula recursive descent parser.
//!
//! Parses token streams into [`Expr`] / [`Equation`]. Precedence, loosest
//! first: `+ -`, `* /`, unary `-`, `^` (right-associative), calls and atoms.

use crate::{Error, Result};
use super::ast::*;
use super::lexer::{Token, TokenKind};

/// Parser state: wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        let tok = self.peek();
        if tok.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, got {:?} '{}'", kind, tok.kind, tok.text)))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: String) -> Error {
        Error::SyntaxError {
            position: self.peek().span.start,
            message: msg,
        }
    }
}

/// Parse `lhs = rhs` from tokens.
pub fn parse_equation(tokens: &[Token]) -> Result<Equation> {
    if tokens.is_empty() {
        return Err(Error::SyntaxError { position: 0, message: "Empty input".into() });
    }
    let mut p = Parser::new(tokens);
    let lhs = parse_expr(&mut p)?;
    p.expect(TokenKind::Eq)?;
    let rhs = parse_expr(&mut p)?;
    if !p.at(TokenKind::Eof) {
        return Err(p.error(format!("Unexpected token after equation: {:?} '{}'", p.peek_kind(), p.peek().text)));
    }
    Ok(Equation { lhs, rhs })
}

/// Parse a bare expression (no `=`) from tokens.
pub fn parse_expression(tokens: &[Token]) -> Result<Expr> {
    if tokens.is_empty() {
        return Err(Error::SyntaxError { position: 0, message: "Empty input".into() });
    }
    let mut p = Parser::new(tokens);
    let expr = parse_expr(&mut p)?;
    if !p.at(TokenKind::Eof) {
        return Err(p.error(format!("Unexpected token after expression: {:?} '{}'", p.peek_kind(), p.peek().text)));
    }
    Ok(expr)
}

// ============================================================================
// Expression parsing (precedence climbing)
// ============================================================================

fn parse_expr(p: &mut Parser) -> Result<Expr> {
    parse_addition(p)
}

fn parse_addition(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_multiplication(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => break,
        };
        p.advance();
        let right = parse_multiplication(p)?;
        left = Expr::binary(left, op, right);
    }
    Ok(left)
}

fn parse_multiplication(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_unary(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            _ => break,
        };
        p.advance();
        let right = parse_unary(p)?;
        left = Expr::binary(left, op, right);
    }
    Ok(left)
}

fn parse_unary(p: &mut Parser) -> Result<Expr> {
    if p.eat(TokenKind::Minus) {
        let expr = parse_unary(p)?;
        // Fold negative literals so `-2` stays a number.
        Ok(match expr {
            Expr::Number(n) => Expr::Number(-n),
            other => Expr::neg(other),
        })
    } else if p.eat(TokenKind::Plus) {
        parse_unary(p)
    } else {
        parse_power(p)
    }
}

fn parse_power(p: &mut Parser) -> Result<Expr> {
    let base = parse_primary(p)?;
    if p.eat(TokenKind::Caret) {
        // Right-associative; exponent may carry its own sign: v^-1
        let exponent = parse_unary(p)?;
        Ok(Expr::pow(base, exponent))
    } else {
        Ok(base)
    }
}

fn parse_primary(p: &mut Parser) -> Result<Expr> {
    match p.peek_kind() {
        TokenKind::Number => {
            let tok = p.advance();
            let val = tok.text.parse::<f64>().map_err(|_| Error::SyntaxError {
                position: tok.span.start,
                message: format!("Invalid number '{}'", tok.text),
            })?;
            Ok(Expr::Number(val))
        }

        TokenKind::LParen => {
            p.advance();
            let expr = parse_expr(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(expr)
        }

        // Identifier: symbol or function call
        TokenKind::Identifier => {
            let tok = p.advance().clone();
            match Function::from_name(&tok.text) {
                Some(func) if p.at(TokenKind::LParen) => {
                    p.advance();
                    let arg = parse_expr(p)?;
                    if p.at(TokenKind::Comma) {
                        return Err(p.error(format!("{}() takes exactly one argument", func.name())));
                    }
                    p.expect(TokenKind::RParen)?;
                    Ok(Expr::call(func, arg))
                }
                Some(func) => Err(Error::SyntaxError {
                    position: tok.span.end,
                    message: format!("Expected '(' after function {}", func.name()),
                }),
                None => Ok(Expr::Symbol(tok.text)),
            }
        }

        _ => Err(p.error(format!("Unexpected token in expression: {:?} '{}'", p.peek_kind(), p.peek().text))),
    }
}
