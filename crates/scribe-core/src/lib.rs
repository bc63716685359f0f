//! Hand-written lexer, AST and recursive-descent parser for a small
//! SQL dialect: DDL (`CREATE TABLE`/`CREATE INDEX`/`DROP TABLE`), DML
//! (`INSERT`/`SELECT`/`UPDATE`/`DELETE`), inner equi-joins, `ORDER BY`
//! and a handful of constraint clauses.
//!
//! The only two entry points a caller needs are [`lex`] and [`parse`].

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod token;

pub use ast::Statement;
pub use errors::{LexError, ParseError};
pub use lexer::lex;
pub use token::{Token, TokenKind};

mod parser;
pub use parser::Parser;

/// Tokenize then parse a single statement. Trailing `;` is optional.
pub fn parse(text: &str) -> Result<Statement, ParseOrLexError> {
    let tokens = lex(text)?;
    Parser::new(tokens).parse_statement().map_err(Into::into)
}

#[derive(Debug, thiserror::Error)]
pub enum ParseOrLexError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_select() {
        let stmt = parse("SELECT * FROM users WHERE id = 1;").unwrap();
        assert!(matches!(stmt, Statement::Select(_)));
    }

    #[test]
    fn surfaces_lexical_errors() {
        let err = parse("SELECT * FROM users WHERE name = 'unterminated").unwrap_err();
        assert!(matches!(err, ParseOrLexError::Lex(LexError::UnterminatedString { .. })));
    }

    #[test]
    fn surfaces_parse_errors() {
        let err = parse("SELECT FROM").unwrap_err();
        assert!(matches!(err, ParseOrLexError::Parse(_)));
    }
}
