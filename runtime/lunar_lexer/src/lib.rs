//! Lunar Lexer - turns source text into tokens.
//!
//! Built on `logos`. The raw logos token enum lives in `raw`; this crate
//! converts it into [`Token`]s carrying decoded literal values and a
//! [`Span`] with the 1-based line number.

mod escape;
mod line_index;
mod raw;
mod token;

use logos::Logos;
use lunar_ir::Span;

pub use line_index::LineIndex;
pub use token::{Token, TokenKind};

use raw::RawToken;

/// Lexing failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: u32,
}

/// Tokenize `source`. The returned list always ends with [`TokenKind::Eof`].
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let lines = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let range = logos.span();
        let line = lines.line_of(range.start);
        let span = Span::from_range(range, line);
        let slice = logos.slice();
        let Ok(raw) = result else {
            return Err(LexError {
                message: describe_failure(slice),
                line,
            });
        };
        if let Some(kind) = TokenKind::from_raw(raw, slice) {
            tokens.push(Token { kind, span });
        }
    }

    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::from_range(end..end, lines.line_of(end)),
    });
    Ok(tokens)
}

fn describe_failure(slice: &str) -> String {
    if slice.starts_with("--") {
        "unfinished long comment".to_string()
    } else if slice.starts_with('[') {
        "unfinished long string".to_string()
    } else if slice.starts_with('"') || slice.starts_with('\'') {
        "unfinished string or invalid escape sequence".to_string()
    } else {
        format!("unexpected symbol near '{slice}'")
    }
}
