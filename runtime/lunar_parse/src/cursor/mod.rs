//! Token cursor for navigating the token stream.

use lunar_ir::Span;
use lunar_lexer::{Token, TokenKind};
use tracing::trace;

use crate::ParseError;

/// Position in a token list. The final token is always `Eof`.
pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token list must end with Eof"
        );
        Cursor { tokens, pos: 0 }
    }

    #[inline]
    pub fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    #[inline]
    pub fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Kind of the token after the current one.
    pub fn peek_kind(&self) -> &TokenKind {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + 1).min(last)].kind
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span,
            None => Span::DUMMY,
        }
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Check the current token's kind without consuming it.
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        trace!(kind = ?token.kind, "advance");
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` or fail with `'x' expected near 'y'`.
    pub fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                &kind.to_string(),
                self.current_kind(),
                self.current_span().line,
            ))
        }
    }

    /// Like `expect`, but names the opening token when the closer is missing.
    ///
    /// `'end' expected (to close 'function' at line 3) near <eof>`
    pub fn expect_closing(
        &mut self,
        kind: &TokenKind,
        opener: &TokenKind,
        opened_at: u32,
    ) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let line = self.current_span().line;
        if line == opened_at {
            return Err(ParseError::expected(&kind.to_string(), self.current_kind(), line));
        }
        Err(ParseError::new(
            format!(
                "{kind} expected (to close {opener} at line {opened_at}) near {}",
                self.current_kind()
            ),
            line,
        ))
    }

    /// Consume a name token.
    pub fn expect_name(&mut self) -> Result<lunar_ir::Name, ParseError> {
        if let TokenKind::Name(name) = self.current_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::expected(
                "<name>",
                self.current_kind(),
                self.current_span().line,
            ))
        }
    }
}

#[cfg(test)]
mod tests;
