//! Statement and expression nodes.
//!
//! The tree is a plain owned tree: `Box` for children, `Vec` for lists.
//! Function definitions are wrapped in `Arc` because every closure created
//! from a definition at runtime holds on to the same body.

mod operators;

use std::sync::Arc;

use crate::Span;

pub use operators::{BinaryOp, UnaryOp, UNARY_PRECEDENCE};

/// Identifier text. Shared because the evaluator turns names into table keys.
pub type Name = Arc<str>;

/// A sequence of statements with its own lexical scope.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }
}

/// A statement node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `a, b.c, d[e] = x, y, z`
    Assign { targets: Vec<Expr>, values: Vec<Expr> },
    /// `local a, b = x, y`
    Local { names: Vec<Name>, values: Vec<Expr> },
    /// `local function f() end`; the name is bound before the body is closed over.
    LocalFunction { name: Name, func: Arc<FunctionDef> },
    /// A call whose results are discarded.
    Call(CallExpr),
    /// `do ... end`
    Do(Block),
    /// `if c then ... elseif c then ... else ... end`
    If {
        branches: Vec<(Expr, Block)>,
        else_block: Option<Block>,
    },
    While { cond: Expr, body: Block },
    /// The condition is evaluated after the body, inside the body's scope.
    Repeat { body: Block, cond: Expr },
    NumericFor {
        var: Name,
        start: Expr,
        limit: Expr,
        step: Option<Expr>,
        body: Block,
    },
    GenericFor {
        names: Vec<Name>,
        exprs: Vec<Expr>,
        body: Block,
    },
    Return(Vec<Expr>),
    Break,
    /// A construct the parser recognizes but the evaluator does not run.
    Unsupported(&'static str),
}

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Whether this expression may produce more than one value.
    ///
    /// Only calls and `...` do; a parenthesized call is truncated to one.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self.kind, ExprKind::Call(_) | ExprKind::Varargs)
    }
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    /// `...`
    Varargs,
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// A bare name, resolved through the scope chain.
    Variable(Name),
    /// `object[key]` and `object.name`
    Index { object: Box<Expr>, key: Box<Expr> },
    Call(CallExpr),
    Function(Arc<FunctionDef>),
    Table(Vec<TableField>),
    /// `(expr)`, truncates a multi-valued expression to its first value.
    Paren(Box<Expr>),
    /// A construct the parser recognizes but the evaluator does not run.
    Unsupported(&'static str),
}

/// `callee(args)` or `receiver:method(args)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    /// Set for method-call syntax; the callee is then the receiver.
    pub method: Option<Name>,
    pub args: Vec<Expr>,
}

/// One entry of a table constructor.
#[derive(Clone, Debug, PartialEq)]
pub enum TableField {
    /// `expr`, assigned the next sequential integer key.
    Positional(Expr),
    /// `name = expr` or `[key] = expr`
    Keyed { key: Expr, value: Expr },
}

/// A function body together with its parameter list.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    /// Name used in error messages and tracing, when one is known.
    pub name: Option<Name>,
    pub params: Vec<Name>,
    pub is_variadic: bool,
    pub body: Block,
    pub span: Span,
}

#[cfg(test)]
mod tests;
