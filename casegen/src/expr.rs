//! Integer arithmetic over the `MIN`/`MAX` bounds of a scope, used by override expressions.
//!
//! Supported syntax: integer literals, `MIN`, `MAX`, parentheses, unary `+`/`-`, and the
//! binary operators `+ - * / // **`. Both `/` and `//` are floor division; `**` is
//! right-associative and binds tighter than unary minus, so `-2**2` is `-4`. All arithmetic
//! is checked and overflow is an error rather than a wrap.

use std::fmt;

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A character outside the supported syntax
    UnexpectedChar(char),
    /// A token in a position the grammar does not allow
    UnexpectedToken(String),
    /// The expression ended early
    UnexpectedEnd,
    /// A name other than `MIN` or `MAX`
    UnknownName(String),
    DivisionByZero,
    NegativeExponent(i64),
    /// The value leaves the 64-bit range on the negative or the positive side
    Overflow { negative: bool },
}

impl ExprError {
    fn overflow(negative: bool) -> Self {
        ExprError::Overflow { negative }
    }

    /// The same error for the negated value
    fn negated(self) -> Self {
        match self {
            ExprError::Overflow { negative } => ExprError::overflow(!negative),
            other => other,
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::UnexpectedChar(c) => write!(f, "unexpected character `{}`", c),
            ExprError::UnexpectedToken(t) => write!(f, "unexpected `{}`", t),
            ExprError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            ExprError::UnknownName(name) => {
                write!(f, "unknown name `{}` (only MIN and MAX are defined)", name)
            }
            ExprError::DivisionByZero => write!(f, "division by zero"),
            ExprError::NegativeExponent(e) => write!(f, "negative exponent {}", e),
            ExprError::Overflow { .. } => write!(f, "value does not fit in a 64-bit integer"),
        }
    }
}

impl std::error::Error for ExprError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Min,
    Max,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(value) => write!(f, "{}", value),
            Token::Min => write!(f, "MIN"),
            Token::Max => write!(f, "MAX"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::StarStar => write!(f, "**"),
            Token::Slash => write!(f, "/"),
            Token::SlashSlash => write!(f, "//"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            c if c.is_whitespace() => pos += 1,
            '0'..='9' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '_') {
                    pos += 1;
                }
                let digits: String = chars[start..pos].iter().filter(|c| **c != '_').collect();
                let value = digits.parse::<i64>().map_err(|_| ExprError::overflow(false))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_')
                {
                    pos += 1;
                }
                let name: String = chars[start..pos].iter().collect();
                match name.as_str() {
                    "MIN" => tokens.push(Token::Min),
                    "MAX" => tokens.push(Token::Max),
                    _ => return Err(ExprError::UnknownName(name)),
                }
            }
            '*' | '/' => {
                let doubled = chars.get(pos + 1) == Some(&c);
                tokens.push(match (c, doubled) {
                    ('*', true) => Token::StarStar,
                    ('*', false) => Token::Star,
                    ('/', true) => Token::SlashSlash,
                    _ => Token::Slash,
                });
                pos += if doubled { 2 } else { 1 };
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

/// Floor division, rounding toward negative infinity
fn floor_div(a: i64, b: i64) -> Result<i64, ExprError> {
    if b == 0 {
        return Err(ExprError::DivisionByZero);
    }
    // only i64::MIN / -1 fails here
    let quotient = a.checked_div(b).ok_or(ExprError::overflow(false))?;
    let remainder = a.checked_rem(b).ok_or(ExprError::overflow(false))?;
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        quotient.checked_sub(1).ok_or(ExprError::overflow(true))
    } else {
        Ok(quotient)
    }
}

fn power(base: i64, exponent: i64) -> Result<i64, ExprError> {
    if exponent < 0 {
        return Err(ExprError::NegativeExponent(exponent));
    }
    let negative = base < 0 && exponent % 2 == 1;
    match base {
        0 => return Ok(if exponent == 0 { 1 } else { 0 }),
        1 => return Ok(1),
        -1 => return Ok(if negative { -1 } else { 1 }),
        _ => {}
    }
    let exponent = u32::try_from(exponent).map_err(|_| ExprError::overflow(negative))?;
    base.checked_pow(exponent).ok_or(ExprError::overflow(negative))
}

struct Evaluator {
    tokens: Vec<Token>,
    pos: usize,
    min: i64,
    max: i64,
}

impl Evaluator {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at(&self, token: &Token) -> bool {
        self.current() == Some(token)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: Token) -> Result<(), ExprError> {
        match self.bump() {
            Some(found) if found == token => Ok(()),
            Some(found) => Err(ExprError::UnexpectedToken(found.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    /// Additive expression (+ -)
    fn additive(&mut self) -> Result<i64, ExprError> {
        let mut value = self.multiplicative()?;
        loop {
            if self.at(&Token::Plus) {
                self.bump();
                let rhs = self.multiplicative()?;
                value = value.checked_add(rhs).ok_or(ExprError::overflow(rhs < 0))?;
            } else if self.at(&Token::Minus) {
                self.bump();
                let rhs = self.multiplicative().map_err(ExprError::negated)?;
                value = value.checked_sub(rhs).ok_or(ExprError::overflow(rhs > 0))?;
            } else {
                return Ok(value);
            }
        }
    }

    /// Multiplicative expression (* / //)
    fn multiplicative(&mut self) -> Result<i64, ExprError> {
        let mut value = self.unary()?;
        while let Some(op) = self.current().cloned() {
            match op {
                Token::Star => {
                    self.bump();
                    let lhs = value;
                    let rhs = self
                        .unary()
                        .map_err(|err| if lhs < 0 { err.negated() } else { err })?;
                    value = lhs
                        .checked_mul(rhs)
                        .ok_or(ExprError::overflow((lhs < 0) != (rhs < 0)))?;
                }
                Token::Slash | Token::SlashSlash => {
                    self.bump();
                    let rhs = self.unary()?;
                    value = floor_div(value, rhs)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// Unary expression (+ -)
    fn unary(&mut self) -> Result<i64, ExprError> {
        if self.at(&Token::Minus) {
            self.bump();
            let value = self.unary().map_err(ExprError::negated)?;
            return value.checked_neg().ok_or(ExprError::overflow(false));
        }
        if self.at(&Token::Plus) {
            self.bump();
            return self.unary();
        }
        self.power()
    }

    /// Power expression (**), right-associative
    fn power(&mut self) -> Result<i64, ExprError> {
        let base = self.primary()?;
        if self.at(&Token::StarStar) {
            self.bump();
            let exponent = self.unary()?;
            return power(base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<i64, ExprError> {
        match self.bump() {
            Some(Token::Int(value)) => Ok(value),
            Some(Token::Min) => Ok(self.min),
            Some(Token::Max) => Ok(self.max),
            Some(Token::LParen) => {
                let value = self.additive()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(other) => Err(ExprError::UnexpectedToken(other.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

/// Evaluate `source` with `MIN` and `MAX` bound to the given values
pub fn evaluate(source: &str, min: i64, max: i64) -> Result<i64, ExprError> {
    let tokens = tokenize(source)?;
    let mut evaluator = Evaluator {
        tokens,
        pos: 0,
        min,
        max,
    };
    let value = evaluator.additive()?;
    match evaluator.bump() {
        None => Ok(value),
        Some(extra) => Err(ExprError::UnexpectedToken(extra.to_string())),
    }
}
