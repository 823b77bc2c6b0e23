//! Statement and block parsing.

mod expr;

use std::sync::Arc;

use lunar_ir::{Block, CallExpr, Expr, ExprKind, FunctionDef, Name, Span, Stmt, StmtKind};
use lunar_lexer::TokenKind;
use lunar_stack::ensure_sufficient_stack;

use crate::{span_from, ParseError, Parser};

impl Parser {
    /// Parse statements until a block terminator (`end`, `else`, `elseif`,
    /// `until`, or end of input). The terminator is not consumed.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut stmts = Vec::new();
        loop {
            if self.at_block_end() {
                break;
            }
            if self.cursor.check(&TokenKind::Return) {
                stmts.push(self.parse_return()?);
                break;
            }
            if let Some(stmt) = self.parse_statement()? {
                stmts.push(stmt);
            }
        }
        Ok(Block::new(stmts))
    }

    fn at_block_end(&self) -> bool {
        matches!(
            self.cursor.current_kind(),
            TokenKind::Eof
                | TokenKind::End
                | TokenKind::Else
                | TokenKind::Elseif
                | TokenKind::Until
        )
    }

    /// Parse one statement. Empty statements (`;`) yield `None`.
    fn parse_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Option<Stmt>, ParseError> {
        let start = self.cursor.current_span();
        let kind = match self.cursor.current_kind() {
            TokenKind::Semicolon => {
                self.cursor.advance();
                return Ok(None);
            }
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Do => {
                self.cursor.advance();
                let body = self.parse_block()?;
                self.cursor
                    .expect_closing(&TokenKind::End, &TokenKind::Do, start.line)?;
                StmtKind::Do(body)
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Repeat => self.parse_repeat()?,
            TokenKind::Function => self.parse_function_stmt()?,
            TokenKind::Local => self.parse_local()?,
            TokenKind::Break => {
                self.cursor.advance();
                if self.loop_depth.last().copied().unwrap_or(0) == 0 {
                    return Err(ParseError::new("no loop to break", start.line));
                }
                StmtKind::Break
            }
            TokenKind::Goto => {
                self.cursor.advance();
                self.cursor.expect_name()?;
                StmtKind::Unsupported("goto")
            }
            TokenKind::DoubleColon => {
                self.cursor.advance();
                self.cursor.expect_name()?;
                self.cursor.expect(&TokenKind::DoubleColon)?;
                StmtKind::Unsupported("label")
            }
            _ => self.parse_expr_statement()?,
        };
        Ok(Some(Stmt::new(kind, span_from(self, start))))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.cursor.advance().span;
        let values = if self.at_block_end() || self.cursor.check(&TokenKind::Semicolon) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.cursor.eat(&TokenKind::Semicolon);
        if !self.at_block_end() {
            return Err(ParseError::expected(
                "'<eof>'",
                self.cursor.current_kind(),
                self.cursor.current_span().line,
            ));
        }
        Ok(Stmt::new(StmtKind::Return(values), span_from(self, start)))
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.cursor.advance().span.line;
        let mut branches = Vec::new();
        let cond = self.parse_expr()?;
        self.cursor.expect(&TokenKind::Then)?;
        branches.push((cond, self.parse_block()?));

        let mut else_block = None;
        loop {
            if self.cursor.eat(&TokenKind::Elseif) {
                let cond = self.parse_expr()?;
                self.cursor.expect(&TokenKind::Then)?;
                branches.push((cond, self.parse_block()?));
            } else if self.cursor.eat(&TokenKind::Else) {
                else_block = Some(self.parse_block()?);
                self.cursor
                    .expect_closing(&TokenKind::End, &TokenKind::If, opened_at)?;
                break;
            } else {
                self.cursor
                    .expect_closing(&TokenKind::End, &TokenKind::If, opened_at)?;
                break;
            }
        }
        Ok(StmtKind::If {
            branches,
            else_block,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.cursor.advance().span.line;
        let cond = self.parse_expr()?;
        self.cursor.expect(&TokenKind::Do)?;
        let body = self.parse_loop_body()?;
        self.cursor
            .expect_closing(&TokenKind::End, &TokenKind::While, opened_at)?;
        Ok(StmtKind::While { cond, body })
    }

    fn parse_repeat(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.cursor.advance().span.line;
        let body = self.parse_loop_body()?;
        self.cursor
            .expect_closing(&TokenKind::Until, &TokenKind::Repeat, opened_at)?;
        let cond = self.parse_expr()?;
        Ok(StmtKind::Repeat { body, cond })
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.cursor.advance().span.line;
        let first = self.cursor.expect_name()?;

        let kind = if self.cursor.eat(&TokenKind::Eq) {
            let start = self.parse_expr()?;
            self.cursor.expect(&TokenKind::Comma)?;
            let limit = self.parse_expr()?;
            let step = if self.cursor.eat(&TokenKind::Comma) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.cursor.expect(&TokenKind::Do)?;
            let body = self.parse_loop_body()?;
            StmtKind::NumericFor {
                var: first,
                start,
                limit,
                step,
                body,
            }
        } else {
            let mut names = vec![first];
            while self.cursor.eat(&TokenKind::Comma) {
                names.push(self.cursor.expect_name()?);
            }
            self.cursor.expect(&TokenKind::In)?;
            let exprs = self.parse_expr_list()?;
            self.cursor.expect(&TokenKind::Do)?;
            let body = self.parse_loop_body()?;
            StmtKind::GenericFor { names, exprs, body }
        };
        self.cursor
            .expect_closing(&TokenKind::End, &TokenKind::For, opened_at)?;
        Ok(kind)
    }

    fn parse_loop_body(&mut self) -> Result<Block, ParseError> {
        if let Some(depth) = self.loop_depth.last_mut() {
            *depth += 1;
        }
        let body = self.parse_block();
        if let Some(depth) = self.loop_depth.last_mut() {
            *depth = depth.saturating_sub(1);
        }
        body
    }

    /// `function a.b.c:m(params) body end`, desugared into an assignment.
    fn parse_function_stmt(&mut self) -> Result<StmtKind, ParseError> {
        let opened_at = self.cursor.advance().span.line;
        let start = self.cursor.current_span();
        let first = self.cursor.expect_name()?;
        let mut full_name = first.to_string();
        let mut target = Expr::new(ExprKind::Variable(first), start);

        while self.cursor.eat(&TokenKind::Dot) {
            let field = self.cursor.expect_name()?;
            full_name.push('.');
            full_name.push_str(&field);
            target = field_access(target, field, span_from(self, start));
        }

        let mut is_method = false;
        if self.cursor.eat(&TokenKind::Colon) {
            let method = self.cursor.expect_name()?;
            full_name.push(':');
            full_name.push_str(&method);
            target = field_access(target, method, span_from(self, start));
            is_method = true;
        }

        let func = self.parse_function_body(Some(Arc::from(full_name)), is_method, opened_at)?;
        let span = func.span;
        Ok(StmtKind::Assign {
            targets: vec![target],
            values: vec![Expr::new(ExprKind::Function(Arc::new(func)), span)],
        })
    }

    fn parse_local(&mut self) -> Result<StmtKind, ParseError> {
        self.cursor.advance();
        if self.cursor.check(&TokenKind::Function) {
            let opened_at = self.cursor.advance().span.line;
            let name = self.cursor.expect_name()?;
            let func = self.parse_function_body(Some(name.clone()), false, opened_at)?;
            return Ok(StmtKind::LocalFunction {
                name,
                func: Arc::new(func),
            });
        }

        let mut names = vec![self.cursor.expect_name()?];
        while self.cursor.eat(&TokenKind::Comma) {
            names.push(self.cursor.expect_name()?);
        }
        let values = if self.cursor.eat(&TokenKind::Eq) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        Ok(StmtKind::Local { names, values })
    }

    /// Assignment or call statement.
    fn parse_expr_statement(&mut self) -> Result<StmtKind, ParseError> {
        let line = self.cursor.current_span().line;
        let first = self.parse_suffixed_expr()?;

        if self.cursor.check(&TokenKind::Eq) || self.cursor.check(&TokenKind::Comma) {
            let mut targets = vec![assignable(first, line)?];
            while self.cursor.eat(&TokenKind::Comma) {
                let target = self.parse_suffixed_expr()?;
                targets.push(assignable(target, line)?);
            }
            self.cursor.expect(&TokenKind::Eq)?;
            let values = self.parse_expr_list()?;
            return Ok(StmtKind::Assign { targets, values });
        }

        match first.kind {
            ExprKind::Call(call) => Ok(StmtKind::Call(call)),
            _ => Err(ParseError::new(
                format!("syntax error near {}", self.cursor.current_kind()),
                self.cursor.current_span().line,
            )),
        }
    }

    /// `(params) block end`. The opening keyword has already been consumed.
    pub(crate) fn parse_function_body(
        &mut self,
        name: Option<Name>,
        is_method: bool,
        opened_at: u32,
    ) -> Result<FunctionDef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&TokenKind::LParen)?;

        let mut params: Vec<Name> = Vec::new();
        if is_method {
            params.push(Arc::from("self"));
        }
        let mut is_variadic = false;
        if !self.cursor.check(&TokenKind::RParen) {
            loop {
                if self.cursor.eat(&TokenKind::Ellipsis) {
                    is_variadic = true;
                    break;
                }
                params.push(self.cursor.expect_name()?);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(&TokenKind::RParen)?;

        self.varargs.push(is_variadic);
        self.loop_depth.push(0);
        let body = self.parse_block();
        self.varargs.pop();
        self.loop_depth.pop();
        let body = body?;

        self.cursor
            .expect_closing(&TokenKind::End, &TokenKind::Function, opened_at)?;
        Ok(FunctionDef {
            name,
            params,
            is_variadic,
            body,
            span: span_from(self, start),
        })
    }
}

pub(crate) fn field_access(object: Expr, field: Name, span: Span) -> Expr {
    let key = Expr::new(ExprKind::String(field), span);
    Expr::new(
        ExprKind::Index {
            object: Box::new(object),
            key: Box::new(key),
        },
        span,
    )
}

fn assignable(expr: Expr, line: u32) -> Result<Expr, ParseError> {
    match expr.kind {
        ExprKind::Variable(_) | ExprKind::Index { .. } => Ok(expr),
        _ => Err(ParseError::new("syntax error near '='", line)),
    }
}

/// Build a call node; used by the postfix parser.
pub(crate) fn call_expr(callee: Expr, method: Option<Name>, args: Vec<Expr>, span: Span) -> Expr {
    Expr::new(
        ExprKind::Call(CallExpr {
            callee: Box::new(callee),
            method,
            args,
        }),
        span,
    )
}
