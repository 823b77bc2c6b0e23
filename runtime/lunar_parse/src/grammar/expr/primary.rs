//! Literals, function expressions, and table constructors.

use std::sync::Arc;

use lunar_ir::{Expr, ExprKind, TableField};
use lunar_lexer::TokenKind;

use crate::{span_from, ParseError, Parser};

impl Parser {
    /// Literals, `...`, `function`, `{...}`, or a suffixed expression.
    pub(super) fn parse_simple_expr(&mut self) -> Result<Expr, ParseError> {
        let span = self.cursor.current_span();
        let kind = match self.cursor.current_kind() {
            TokenKind::Number(n) => ExprKind::Number(*n),
            TokenKind::String(s) => ExprKind::String(s.clone()),
            TokenKind::Nil => ExprKind::Nil,
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Ellipsis => {
                if !self.varargs.last().copied().unwrap_or(false) {
                    return Err(ParseError::new(
                        "cannot use '...' outside a vararg function",
                        span.line,
                    ));
                }
                ExprKind::Varargs
            }
            TokenKind::Function => {
                self.cursor.advance();
                let func = self.parse_function_body(None, false, span.line)?;
                return Ok(Expr::new(
                    ExprKind::Function(Arc::new(func)),
                    span_from(self, span),
                ));
            }
            TokenKind::LBrace => return self.parse_table_constructor(),
            _ => return self.parse_suffixed_expr(),
        };
        self.cursor.advance();
        Ok(Expr::new(kind, span))
    }

    /// `{ [k] = v, name = v, v; ... }`
    pub(super) fn parse_table_constructor(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();

        while !self.cursor.check(&TokenKind::RBrace) {
            let field = if self.cursor.check(&TokenKind::LBracket) {
                self.cursor.advance();
                let key = self.parse_expr()?;
                self.cursor.expect(&TokenKind::RBracket)?;
                self.cursor.expect(&TokenKind::Eq)?;
                TableField::Keyed {
                    key,
                    value: self.parse_expr()?,
                }
            } else if matches!(self.cursor.current_kind(), TokenKind::Name(_))
                && matches!(self.cursor.peek_kind(), TokenKind::Eq)
            {
                let key_span = self.cursor.current_span();
                let name = self.cursor.expect_name()?;
                self.cursor.advance();
                let key = Expr::new(ExprKind::String(name), key_span);
                TableField::Keyed {
                    key,
                    value: self.parse_expr()?,
                }
            } else {
                TableField::Positional(self.parse_expr()?)
            };
            fields.push(field);

            if !self.cursor.eat(&TokenKind::Comma) && !self.cursor.eat(&TokenKind::Semicolon) {
                break;
            }
        }
        self.cursor
            .expect_closing(&TokenKind::RBrace, &TokenKind::LBrace, start.line)?;
        Ok(Expr::new(ExprKind::Table(fields), span_from(self, start)))
    }
}
