//! Parse error types.

use lunar_lexer::{LexError, TokenKind};

/// A syntax error, reported before any statement executes.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        ParseError {
            message: message.into(),
            line,
        }
    }

    /// `expected 'x' near 'y'`
    #[cold]
    pub fn expected(what: &str, found: &TokenKind, line: u32) -> Self {
        ParseError::new(format!("{what} expected near {found}"), line)
    }

    /// `unexpected symbol near 'y'`
    #[cold]
    pub fn unexpected(found: &TokenKind, line: u32) -> Self {
        ParseError::new(format!("unexpected symbol near {found}"), line)
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            line: err.line,
        }
    }
}
