//! # Formula Expressions
//!
//! Formula text → normalized ASCII → tokens → [`Equation`] AST, plus the
//! symbolic rearrangement and numeric evaluation used by the solver.
//! Pure functions; no storage dependency.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod rearrange;

use crate::Result;
use ast::{Equation, Expr};
use lexer::Vocabulary;

pub use normalize::normalize;

/// Parse an already-normalized `lhs = rhs` string.
pub fn parse_equation_str(text: &str, vocab: &Vocabulary) -> Result<Equation> {
    let tokens = lexer::tokenize(text, vocab)?;
    parser::parse_equation(&tokens)
}

/// Parse an already-normalized expression without `=`.
pub fn parse_expression_str(text: &str, vocab: &Vocabulary) -> Result<Expr> {
    let tokens = lexer::tokenize(text, vocab)?;
    parser::parse_expression(&tokens)
}

/// Number of `=` signs in `text`, counting `==` once.
pub fn equals_count(text: &str) -> usize {
    text.replace("==", "=").matches('=').count()
}
