use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unknown character '{character}' at position {position}")]
    UnknownCharacter { character: char, position: usize },
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: Token },
    #[error("unsupported SQL command: {found}")]
    UnsupportedStatement { found: Token },
}
