use std::fmt;
use std::ops::Range;

use smol_str::SmolStr;

/// The classification of a single lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Symbol,
    String,
    Number,
    Operator,
    Null,
    End,
}

/// A single lexical token with its raw text and source span.
///
/// Keywords are normalized to upper case by the lexer; identifiers keep
/// their original spelling. `span` is a byte range into the source text,
/// used only to make error messages point at the right place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, span: Range<usize>) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.chars().eq(std::iter::once(symbol))
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::End => write!(f, "end of input"),
            TokenKind::String => write!(f, "string literal {:?}", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "CREATE",
    "TABLE", "INDEX", "ON", "ORDER", "BY", "ASC", "DESC", "PRIMARY", "KEY", "UNIQUE", "FOREIGN",
    "REFERENCES", "INNER", "JOIN", "LEFT", "RIGHT", "OUTER", "DROP", "NULL",
];

pub fn keyword_lookup(word_upper: &str) -> Option<&'static str> {
    KEYWORDS.iter().find(|k| **k == word_upper).copied()
}
