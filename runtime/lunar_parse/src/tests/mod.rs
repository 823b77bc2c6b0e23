//! Parser tests, grouped by construct.

mod stmt_tests;

use lunar_ir::{Block, Expr, ExprKind, Stmt, StmtKind};

pub(crate) fn parse_ok(source: &str) -> Block {
    match crate::parse_block(source) {
        Ok(block) => block,
        Err(err) => panic!("parse failed for {source:?}: {err}"),
    }
}

pub(crate) fn parse_err(source: &str) -> crate::ParseError {
    match crate::parse_block(source) {
        Ok(block) => panic!("expected parse error for {source:?}, got {block:?}"),
        Err(err) => err,
    }
}

/// First statement of a single-statement chunk.
pub(crate) fn single(source: &str) -> Stmt {
    let mut block = parse_ok(source);
    assert_eq!(block.stmts.len(), 1, "{source:?}");
    block.stmts.remove(0)
}

/// The expression in `return <expr>`.
pub(crate) fn returned(expr_source: &str) -> Expr {
    match single(&format!("return {expr_source}")).kind {
        StmtKind::Return(mut values) => values.remove(0),
        other => panic!("not a return: {other:?}"),
    }
}

pub(crate) fn var(expr: &Expr) -> &str {
    match &expr.kind {
        ExprKind::Variable(name) => name,
        other => panic!("not a variable: {other:?}"),
    }
}
