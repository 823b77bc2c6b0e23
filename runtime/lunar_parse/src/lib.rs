//! Lunar Parse - recursive-descent parser producing `lunar_ir` trees.
//!
//! # Module Structure
//!
//! - `cursor`: token navigation and `expect` helpers
//! - `grammar`: statements, function bodies, blocks
//! - `grammar::expr`: precedence climbing, primary and postfix expressions
//!
//! A whole source file parses into one variadic [`FunctionDef`], the chunk
//! function, whose body is the file's top-level block.

mod cursor;
mod error;
mod grammar;

use std::sync::Arc;

use lunar_ir::{Block, FunctionDef, Span};
use tracing::debug;

pub use cursor::Cursor;
pub use error::ParseError;

/// Name given to the chunk function in error messages.
pub const CHUNK_NAME: &str = "main chunk";

/// Parser state.
pub struct Parser {
    cursor: Cursor,
    /// One entry per enclosing function: whether it accepts `...`.
    varargs: Vec<bool>,
    /// Number of enclosing loops in the current function, for `break`.
    loop_depth: Vec<u32>,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = lunar_lexer::lex(source)?;
        Ok(Parser {
            cursor: Cursor::new(tokens),
            varargs: vec![true],
            loop_depth: vec![0],
        })
    }

    /// Parse the whole input as a chunk.
    pub fn parse_chunk(mut self) -> Result<FunctionDef, ParseError> {
        let start = self.cursor.current_span();
        let body = self.parse_block()?;
        if !self.cursor.is_at_end() {
            return Err(ParseError::expected(
                "'<eof>'",
                self.cursor.current_kind(),
                self.cursor.current_span().line,
            ));
        }
        Ok(FunctionDef {
            name: Some(Arc::from(CHUNK_NAME)),
            params: Vec::new(),
            is_variadic: true,
            body,
            span: start.merge(self.cursor.current_span()),
        })
    }
}

/// Parse `source` into its chunk function.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str) -> Result<FunctionDef, ParseError> {
    let chunk = Parser::new(source)?.parse_chunk()?;
    debug!(statements = chunk.body.stmts.len(), "parsed chunk");
    Ok(chunk)
}

/// Parse `source` and return only the top-level block.
pub fn parse_block(source: &str) -> Result<Block, ParseError> {
    parse(source).map(|chunk| chunk.body)
}

/// Span covering `start` through the most recently consumed token.
fn span_from(parser: &Parser, start: Span) -> Span {
    start.merge(parser.cursor.previous_span())
}

#[cfg(test)]
mod tests;
