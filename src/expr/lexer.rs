//! Formula lexer: tokenizes a normalized expression string.
//!
//! Physics notation omits multiplication operators (`ma`, `2mv`, `ρgh`).
//! [`tokenize`] therefore splits identifier runs against a vocabulary of
//! known symbols and inserts the implied `*` tokens.

use std::collections::BTreeSet;

use crate::{Error, Result};
use super::ast::Function;

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span (byte offsets into the normalized input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Identifier,

    // Punctuation
    LParen, RParen, Comma,

    // Operators
    Eq, Plus, Minus, Star, Slash, Caret,

    Eof,
}

/// Symbols that may appear as whole identifiers in an expression.
///
/// Anything not in the vocabulary (and not a function name or `pi`) is
/// read as a product of shorter symbols.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    symbols: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if !symbol.is_empty() {
            self.symbols.insert(symbol);
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol) || symbol == "pi" || Function::from_name(symbol).is_some()
    }

    /// Longest vocabulary entry that prefixes `s`, in bytes.
    fn longest_prefix(&self, s: &str) -> Option<usize> {
        self.symbols
            .iter()
            .map(String::as_str)
            .chain(std::iter::once("pi"))
            .chain(Function::ALL.iter().map(|f| f.name()))
            .filter(|sym| s.starts_with(sym))
            .map(str::len)
            .max()
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut vocab = Self::new();
        for s in iter {
            vocab.insert(s);
        }
        vocab
    }
}

/// Tokenize a normalized expression, splitting unknown identifier runs and
/// inserting implicit multiplication.
pub fn tokenize(input: &str, vocab: &Vocabulary) -> Result<Vec<Token>> {
    let raw = scan(input)?;
    let split = split_identifiers(raw, vocab);
    Ok(insert_implicit_multiplication(split))
}

/// Pass 1: plain scanning, no knowledge of symbols.
fn scan(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => { chars.next(); }

            // Numbers: 12, 0.5, .5, 6.02e23
            c if c.is_ascii_digit() || (c == '.' && matches!(chars.clone().nth(1), Some((_, d)) if d.is_ascii_digit())) => {
                let start = pos;
                let mut num = String::new();
                let mut seen_dot = false;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        num.push(c);
                        chars.next();
                    } else if c == '.' && !seen_dot {
                        seen_dot = true;
                        num.push(c);
                        chars.next();
                    } else if (c == 'e' || c == 'E') && exponent_follows(&chars) {
                        num.push(c);
                        chars.next();
                        if let Some(&(_, sign)) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                num.push(sign);
                                chars.next();
                            }
                        }
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Number,
                    span: Span { start, end: start + num.len() },
                    text: num,
                });
            }

            // Identifiers: letters, then letters/digits/underscores
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Identifier,
                    span: Span { start, end: start + ident.len() },
                    text: ident,
                });
            }

            '(' | '[' => { chars.next(); tokens.push(punct(TokenKind::LParen, pos, "(")); }
            ')' | ']' => { chars.next(); tokens.push(punct(TokenKind::RParen, pos, ")")); }
            ',' => { chars.next(); tokens.push(punct(TokenKind::Comma, pos, ",")); }
            '+' => { chars.next(); tokens.push(punct(TokenKind::Plus, pos, "+")); }
            '-' => { chars.next(); tokens.push(punct(TokenKind::Minus, pos, "-")); }
            '/' => { chars.next(); tokens.push(punct(TokenKind::Slash, pos, "/")); }
            '^' => { chars.next(); tokens.push(punct(TokenKind::Caret, pos, "^")); }
            '*' => {
                chars.next();
                // Fortran-style power: a**2
                if matches!(chars.peek(), Some(&(_, '*'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Caret, pos, "**"));
                } else {
                    tokens.push(punct(TokenKind::Star, pos, "*"));
                }
            }
            '=' => {
                chars.next();
                // Tolerate `==`
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                }
                tokens.push(punct(TokenKind::Eq, pos, "="));
            }

            other => {
                return Err(Error::SyntaxError {
                    position: pos,
                    message: format!("Unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

/// After a mantissa, `e` starts an exponent only when digits follow.
fn exponent_follows(chars: &std::iter::Peekable<std::str::CharIndices<'_>>) -> bool {
    let mut ahead = chars.clone();
    ahead.next(); // the 'e'
    match ahead.next() {
        Some((_, d)) if d.is_ascii_digit() => true,
        Some((_, '+' | '-')) => matches!(ahead.next(), Some((_, d)) if d.is_ascii_digit()),
        _ => false,
    }
}

/// Pass 2: break identifiers that are not whole symbols into pieces.
///
/// `mgh` with vocabulary {m, g, h} becomes `m * g * h`; `v0t` with {v0, t}
/// becomes `v0 * t`; `a2` with {a} becomes `a * 2`.
fn split_identifiers(tokens: Vec<Token>, vocab: &Vocabulary) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if tok.kind != TokenKind::Identifier || vocab.contains(&tok.text) {
            out.push(tok);
            continue;
        }

        let text = tok.text.as_str();
        let mut offset = 0;
        let mut first = true;
        while offset < text.len() {
            let rest = &text[offset..];
            let (kind, len) = if let Some(len) = vocab.longest_prefix(rest) {
                (TokenKind::Identifier, len)
            } else if rest.starts_with(|c: char| c.is_ascii_digit()) {
                let len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                (TokenKind::Number, len)
            } else if let Some(c) = rest.chars().next() {
                (TokenKind::Identifier, c.len_utf8())
            } else {
                break;
            };

            if !first {
                out.push(punct(TokenKind::Star, tok.span.start + offset, "*"));
            }
            let start = tok.span.start + offset;
            out.push(Token {
                kind,
                span: Span { start, end: start + len },
                text: rest[..len].to_string(),
            });
            offset += len;
            first = false;
        }
    }
    out
}

/// Pass 3: `2m` → `2*m`, `)(` → `)*(`, `m(` → `m*(` unless `m` is a function.
fn insert_implicit_multiplication(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if let Some(prev) = out.last() {
            let prev_is_operand = matches!(prev.kind, TokenKind::Number | TokenKind::Identifier | TokenKind::RParen);
            let next_is_operand = matches!(tok.kind, TokenKind::Number | TokenKind::Identifier | TokenKind::LParen);
            let is_call = prev.kind == TokenKind::Identifier
                && tok.kind == TokenKind::LParen
                && Function::from_name(&prev.text).is_some();
            if prev_is_operand && next_is_operand && !is_call {
                out.push(punct(TokenKind::Star, tok.span.start, "*"));
            }
        }
        out.push(tok);
    }
    out
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}
