use super::*;
use pretty_assertions::assert_eq;

fn num(n: f64) -> Expr {
    Expr::new(ExprKind::Number(n), Span::DUMMY)
}

#[test]
fn test_multi_valued_expressions() {
    let call = Expr::new(
        ExprKind::Call(CallExpr {
            callee: Box::new(Expr::new(ExprKind::Variable("f".into()), Span::DUMMY)),
            method: None,
            args: vec![],
        }),
        Span::DUMMY,
    );
    assert!(call.is_multi_valued());
    assert!(Expr::new(ExprKind::Varargs, Span::DUMMY).is_multi_valued());
    assert!(!Expr::new(ExprKind::Paren(Box::new(call)), Span::DUMMY).is_multi_valued());
    assert!(!num(1.0).is_multi_valued());
}

#[test]
fn test_operator_symbols() {
    assert_eq!(BinaryOp::NotEq.as_symbol(), "~=");
    assert_eq!(BinaryOp::Concat.as_symbol(), "..");
    assert_eq!(UnaryOp::Len.as_symbol(), "#");
}

#[test]
fn test_precedence_ordering() {
    assert!(BinaryOp::Mul.precedence().0 > BinaryOp::Add.precedence().0);
    assert!(BinaryOp::Add.precedence().0 > BinaryOp::Concat.precedence().0);
    assert!(BinaryOp::Pow.precedence().0 > UNARY_PRECEDENCE);
    assert!(UNARY_PRECEDENCE > BinaryOp::Mul.precedence().0);
    // right associative
    let (l, r) = BinaryOp::Concat.precedence();
    assert!(r < l);
}

#[test]
fn test_operator_classes() {
    assert!(BinaryOp::And.is_short_circuit());
    assert!(BinaryOp::Pow.is_arithmetic());
    assert!(!BinaryOp::Concat.is_arithmetic());
    assert!(BinaryOp::GtEq.is_ordering());
    assert!(!BinaryOp::Eq.is_ordering());
}

#[test]
fn test_unary_precedence_is_exported_at_crate_root() {
    assert_eq!(crate::UNARY_PRECEDENCE, UNARY_PRECEDENCE);
}
