// Arithmetic formulas for computed salary components.
//
// Grammar:
//   expr     := term (('+' | '-') term)*
//   term     := factor (('*' | '/') factor)*
//   factor   := ('+' | '-') factor | number | variable | '(' expr ')'
//   variable := '{' identifier '}'
//
// Anything outside digits, '.', whitespace, the four operators, parentheses
// and `{identifier}` placeholders rejects the whole formula. Nothing is ever
// executed besides decimal arithmetic.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("character '{character}' is not allowed (position {position})")]
    DisallowedCharacter { character: char, position: usize },

    #[error("variable starting at position {0} is not closed")]
    UnterminatedVariable(usize),

    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("formula nests too deeply")]
    TooDeep,

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,
}

type FormulaResult<T> = std::result::Result<T, FormulaError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Variable(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    position: usize,
}

/// Evaluate `formula`, resolving `{name}` placeholders through `lookup`
pub fn evaluate<F>(formula: &str, lookup: F) -> FormulaResult<Decimal>
where
    F: Fn(&str) -> Option<Decimal>,
{
    let tokens = tokenize(formula)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        depth: 0,
        lookup: &lookup,
    };

    let value = parser.expr()?;

    match parser.peek() {
        None => Ok(value),
        Some(Spanned {
            token: Token::RParen,
            ..
        }) => Err(FormulaError::UnbalancedParentheses),
        Some(spanned) => Err(FormulaError::UnexpectedToken(spanned.position)),
    }
}

/// Names of the variables a formula references, in order of appearance
pub fn variables(formula: &str) -> FormulaResult<Vec<String>> {
    Ok(tokenize(formula)?
        .into_iter()
        .filter_map(|spanned| match spanned.token {
            Token::Variable(name) => Some(name),
            _ => None,
        })
        .collect())
}

fn tokenize(source: &str) -> FormulaResult<Vec<Spanned>> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];

        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let value = Decimal::from_str(&text)
                    .map_err(|_| FormulaError::InvalidNumber(text.clone()))?;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    position,
                });
                continue;
            }
            '{' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|(_, c)| *c == '}')
                    .map(|offset| i + 1 + offset)
                    .ok_or(FormulaError::UnterminatedVariable(position))?;
                let name: String = chars[i + 1..close].iter().map(|(_, c)| *c).collect();

                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(FormulaError::InvalidVariableName(name));
                }

                i = close + 1;
                tokens.push(Spanned {
                    token: Token::Variable(name),
                    position,
                });
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(FormulaError::DisallowedCharacter {
                    character: other,
                    position,
                })
            }
        };

        tokens.push(Spanned { token, position });
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a, F> {
    tokens: &'a [Spanned],
    cursor: usize,
    depth: usize,
    lookup: &'a F,
}

impl<'a, F> Parser<'a, F>
where
    F: Fn(&str) -> Option<Decimal>,
{
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<&'a Spanned> {
        let spanned = self.tokens.get(self.cursor);
        if spanned.is_some() {
            self.cursor += 1;
        }
        spanned
    }

    fn expr(&mut self) -> FormulaResult<Decimal> {
        let mut value = self.term()?;

        while let Some(spanned) = self.peek() {
            match spanned.token {
                Token::Plus => {
                    self.cursor += 1;
                    let rhs = self.term()?;
                    value = value.checked_add(rhs).ok_or(FormulaError::Overflow)?;
                }
                Token::Minus => {
                    self.cursor += 1;
                    let rhs = self.term()?;
                    value = value.checked_sub(rhs).ok_or(FormulaError::Overflow)?;
                }
                _ => break,
            }
        }

        Ok(value)
    }

    fn term(&mut self) -> FormulaResult<Decimal> {
        let mut value = self.factor()?;

        while let Some(spanned) = self.peek() {
            match spanned.token {
                Token::Star => {
                    self.cursor += 1;
                    let rhs = self.factor()?;
                    value = value.checked_mul(rhs).ok_or(FormulaError::Overflow)?;
                }
                Token::Slash => {
                    self.cursor += 1;
                    let rhs = self.factor()?;
                    if rhs.is_zero() {
                        return Err(FormulaError::DivisionByZero);
                    }
                    value = value.checked_div(rhs).ok_or(FormulaError::Overflow)?;
                }
                _ => break,
            }
        }

        Ok(value)
    }

    fn factor(&mut self) -> FormulaResult<Decimal> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaError::TooDeep);
        }

        let value = self.primary();
        self.depth -= 1;
        value
    }

    fn primary(&mut self) -> FormulaResult<Decimal> {
        let spanned = self.next().ok_or(FormulaError::UnexpectedEnd)?;

        match &spanned.token {
            Token::Plus => self.factor(),
            Token::Minus => Ok(-self.factor()?),
            Token::Number(value) => Ok(*value),
            Token::Variable(name) => {
                (self.lookup)(name).ok_or_else(|| FormulaError::UnknownVariable(name.clone()))
            }
            Token::LParen => {
                let value = self.expr()?;
                match self.next() {
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => Ok(value),
                    Some(other) => Err(FormulaError::UnexpectedToken(other.position)),
                    None => Err(FormulaError::UnbalancedParentheses),
                }
            }
            Token::RParen => Err(FormulaError::UnbalancedParentheses),
            Token::Star | Token::Slash => Err(FormulaError::UnexpectedToken(spanned.position)),
        }
    }
}
