use std::str::CharIndices;

use crate::errors::LexError;
use crate::token::{self, Token, TokenKind};

const SYMBOLS: &[char] = &['(', ')', ',', ';', '*', '.'];
const TWO_CHAR_OPERATORS: &[&str] = &["<=", ">=", "!=", "<>"];

/// Turns source text into a flat token stream terminated by [`TokenKind::End`].
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }
            let token = if ch == '\'' || ch == '"' {
                self.lex_string(pos, ch)?
            } else if ch.is_ascii_digit() {
                self.lex_number(pos)
            } else if ch.is_alphabetic() || ch == '_' {
                self.lex_identifier_or_keyword(pos)
            } else if SYMBOLS.contains(&ch) {
                self.chars.next();
                Token::new(TokenKind::Symbol, ch.to_string(), pos..pos + ch.len_utf8())
            } else if matches!(ch, '<' | '>' | '!' | '=') {
                self.lex_operator(pos)
            } else {
                return Err(LexError::UnknownCharacter {
                    character: ch,
                    position: pos,
                });
            };
            tokens.push(token);
        }
        let end = self.source.len();
        tokens.push(Token::new(TokenKind::End, "", end..end));
        Ok(tokens)
    }

    fn lex_string(&mut self, start: usize, quote: char) -> Result<Token, LexError> {
        self.chars.next(); // consume opening quote
        let content_start = start + quote.len_utf8();
        let mut end = content_start;
        loop {
            match self.chars.peek().copied() {
                Some((pos, c)) if c == quote => {
                    end = pos;
                    self.chars.next();
                    break;
                }
                Some((pos, c)) => {
                    end = pos + c.len_utf8();
                    self.chars.next();
                }
                None => {
                    return Err(LexError::UnterminatedString { position: start });
                }
            }
        }
        let text = &self.source[content_start..end];
        Ok(Token::new(TokenKind::String, text, start..end + quote.len_utf8()))
    }

    fn lex_number(&mut self, start: usize) -> Token {
        let mut end = start;
        let mut seen_dot = false;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                end = pos + 1;
                self.chars.next();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                end = pos + 1;
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        Token::new(TokenKind::Number, text, start..end)
    }

    fn lex_identifier_or_keyword(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = pos + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let raw = &self.source[start..end];
        let upper = raw.to_ascii_uppercase();
        if let Some(keyword) = token::keyword_lookup(&upper) {
            if keyword == "NULL" {
                Token::new(TokenKind::Null, keyword, start..end)
            } else {
                Token::new(TokenKind::Keyword, keyword, start..end)
            }
        } else {
            Token::new(TokenKind::Identifier, raw, start..end)
        }
    }

    fn lex_operator(&mut self, start: usize) -> Token {
        let two_char: Option<String> = {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            lookahead
                .peek()
                .map(|&(_, c)| self.source[start..start + c.len_utf8() + 1].to_string())
        };
        if let Some(candidate) = two_char {
            if TWO_CHAR_OPERATORS.contains(&candidate.as_str()) {
                self.chars.next();
                self.chars.next();
                let end = start + candidate.len();
                return Token::new(TokenKind::Operator, candidate, start..end);
            }
        }
        let (_, ch) = self.chars.next().unwrap();
        Token::new(TokenKind::Operator, ch.to_string(), start..start + ch.len_utf8())
    }
}

pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    log::trace!("lexing: {source:?}");
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_select_statement() {
        let tokens = lex("SELECT * FROM users WHERE id = 1;").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Symbol,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Symbol,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn identifier_case_is_preserved_but_keyword_is_normalized() {
        let tokens = lex("select MyTable").unwrap();
        assert_eq!(tokens[0].text, "SELECT");
        assert_eq!(tokens[1].text, "MyTable");
    }

    #[test]
    fn null_gets_its_own_token_kind() {
        let tokens = lex("null").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Null);
    }

    #[test]
    fn greedily_prefers_two_char_operators() {
        let tokens = lex("a <= b").unwrap();
        assert_eq!(tokens[1].text, "<=");
        let tokens = lex("a <> b").unwrap();
        assert_eq!(tokens[1].text, "<>");
        let tokens = lex("a < b").unwrap();
        assert_eq!(tokens[1].text, "<");
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = lex("'abc").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { position: 0 });
    }

    #[test]
    fn unknown_character_is_a_lex_error() {
        let err = lex("a @ b").unwrap_err();
        assert_eq!(
            err,
            LexError::UnknownCharacter {
                character: '@',
                position: 2
            }
        );
    }

    #[test]
    fn numeric_literal_with_dot_is_a_single_token() {
        let tokens = lex("3.14").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "3.14");
    }
}
