//! Lunar IR - syntax tree types shared by the parser and the evaluator.
//!
//! This crate contains:
//! - Spans for source locations
//! - Statement and expression nodes (`Stmt`, `Expr`)
//! - Binary and unary operator enums
//!
//! Function bodies are reference counted (`Arc<FunctionDef>`) so closures
//! created at runtime share the parsed body instead of cloning it.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod span;

pub use ast::{
    BinaryOp, Block, CallExpr, Expr, ExprKind, FunctionDef, Name, Stmt, StmtKind, TableField,
    UnaryOp, UNARY_PRECEDENCE,
};
pub use span::Span;
