//! # Offset Expressions
//!
//! `height-offset-expression` and `forward-offset-expression` hold small
//! arithmetic formulas: numbers, `+ - * /`, unary minus and parentheses.
//! They are folded to a constant when parsed.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | atom
//! atom   := NUMBER | '(' expr ')'
//! ```

use std::fmt;

use crate::error::{EffectError, EffectResult};

/// Deepest run of nested parentheses and unary minuses accepted.
const MAX_NESTING: usize = 64;

/// A parsed, constant-folded offset expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    source: String,
    value: f64,
}

impl Expression {
    /// Parses and evaluates `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::Expression`] on malformed input, division by
    /// zero, or nesting deeper than 64 levels.
    pub fn parse(source: &str) -> EffectResult<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let value = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(Self {
            source: source.to_string(),
            value,
        })
    }

    /// Expression standing for a plain scalar, written as `0 + <value>`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            source: format!("0 + {value}"),
            value,
        }
    }

    /// The text this expression was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The folded value.
    #[must_use]
    pub const fn resolve(&self) -> f64 {
        self.value
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

fn tokenize(source: &str) -> EffectResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::Open,
            ')' => Token::Close,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &source[start..end];
                let value = literal.parse::<f64>().map_err(|_| EffectError::Expression {
                    input: source.to_string(),
                    reason: format!("bad number {literal:?}"),
                })?;
                tokens.push(Token::Number(value));
                continue;
            }
            other => {
                return Err(EffectError::Expression {
                    input: source.to_string(),
                    reason: format!("unexpected character {other:?} at {start}"),
                })
            }
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn error(&self, reason: &str) -> EffectError {
        EffectError::Expression {
            input: self.source.to_string(),
            reason: reason.to_string(),
        }
    }

    fn enter(&mut self) -> EffectResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn expr(&mut self) -> EffectResult<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> EffectResult<f64> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = if op == Token::Star {
                value * rhs
            } else if rhs == 0.0 {
                return Err(self.error("division by zero"));
            } else {
                value / rhs
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> EffectResult<f64> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            self.enter()?;
            let value = -self.unary()?;
            self.depth -= 1;
            return Ok(value);
        }
        self.atom()
    }

    fn atom(&mut self) -> EffectResult<f64> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                self.enter()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(_) => Err(self.error("expected a number or '('")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}
