//! Names, parenthesized expressions, and `.` / `[]` / `:` / call suffixes.

use lunar_ir::{Expr, ExprKind};
use lunar_lexer::TokenKind;

use crate::grammar::{call_expr, field_access};
use crate::{span_from, ParseError, Parser};

impl Parser {
    /// `Name` or `( expr )`.
    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.current_span();
        match self.cursor.current_kind() {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Variable(name), start))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                self.cursor
                    .expect_closing(&TokenKind::RParen, &TokenKind::LParen, start.line)?;
                Ok(Expr::new(
                    ExprKind::Paren(Box::new(inner)),
                    span_from(self, start),
                ))
            }
            other => Err(ParseError::unexpected(other, start.line)),
        }
    }

    /// A primary expression followed by any number of suffixes.
    pub(crate) fn parse_suffixed_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.current_span();
        let mut expr = self.parse_primary_expr()?;
        loop {
            match self.cursor.current_kind() {
                TokenKind::Dot => {
                    self.cursor.advance();
                    let name = self.cursor.expect_name()?;
                    expr = field_access(expr, name, span_from(self, start));
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let key = self.parse_expr()?;
                    self.cursor.expect(&TokenKind::RBracket)?;
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            key: Box::new(key),
                        },
                        span_from(self, start),
                    );
                }
                TokenKind::Colon => {
                    self.cursor.advance();
                    let method = self.cursor.expect_name()?;
                    let args = self.parse_call_args()?;
                    expr = call_expr(expr, Some(method), args, span_from(self, start));
                }
                TokenKind::LParen | TokenKind::String(_) | TokenKind::LBrace => {
                    let args = self.parse_call_args()?;
                    expr = call_expr(expr, None, args, span_from(self, start));
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `( explist )`, a table constructor, or a string literal.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let span = self.cursor.current_span();
        match self.cursor.current_kind() {
            TokenKind::String(s) => {
                let s = s.clone();
                self.cursor.advance();
                Ok(vec![Expr::new(ExprKind::String(s), span)])
            }
            TokenKind::LBrace => Ok(vec![self.parse_table_constructor()?]),
            TokenKind::LParen => {
                self.cursor.advance();
                let args = if self.cursor.check(&TokenKind::RParen) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.cursor
                    .expect_closing(&TokenKind::RParen, &TokenKind::LParen, span.line)?;
                Ok(args)
            }
            other => Err(ParseError::expected("function arguments", other, span.line)),
        }
    }
}
