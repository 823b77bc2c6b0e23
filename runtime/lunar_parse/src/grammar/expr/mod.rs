//! Expression parsing.
//!
//! - `mod.rs`: entry points and precedence climbing over binary operators
//! - `primary.rs`: literals, function expressions, table constructors
//! - `postfix.rs`: names, parenthesized expressions, field/index/call chains

mod postfix;
mod primary;

use lunar_ir::{BinaryOp, Expr, ExprKind, UnaryOp, UNARY_PRECEDENCE};
use lunar_lexer::TokenKind;
use lunar_stack::ensure_sufficient_stack;

use crate::{span_from, ParseError, Parser};

impl Parser {
    /// Parse an expression.
    ///
    /// Uses `ensure_sufficient_stack` so deeply nested input does not
    /// overflow the native stack.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_subexpr(0))
    }

    /// Comma-separated, non-empty expression list.
    pub(crate) fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.cursor.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    /// Precedence climbing: parse operators whose left power exceeds `limit`.
    fn parse_subexpr(&mut self, limit: u8) -> Result<Expr, ParseError> {
        let start = self.cursor.current_span();
        let mut left = if let Some(op) = unary_op(self.cursor.current_kind()) {
            self.cursor.advance();
            let operand = ensure_sufficient_stack(|| self.parse_subexpr(UNARY_PRECEDENCE))?;
            Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span_from(self, start),
            )
        } else {
            self.parse_simple_expr()?
        };

        while let Some(op) = binary_op(self.cursor.current_kind()) {
            let (left_power, right_power) = op.precedence();
            if left_power <= limit {
                break;
            }
            self.cursor.advance();
            let right = ensure_sufficient_stack(|| self.parse_subexpr(right_power))?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span_from(self, start),
            );
        }
        Ok(left)
    }
}

fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Not => Some(UnaryOp::Not),
        TokenKind::Hash => Some(UnaryOp::Len),
        _ => None,
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Caret => BinaryOp::Pow,
        TokenKind::DotDot => BinaryOp::Concat,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}
