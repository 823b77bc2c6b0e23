use super::*;
use lunar_lexer::lex;
use pretty_assertions::assert_eq;

fn cursor(source: &str) -> Cursor {
    Cursor::new(lex(source).unwrap())
}

#[test]
fn test_advance_stops_at_eof() {
    let mut c = cursor("a");
    assert!(matches!(c.advance().kind, TokenKind::Name(_)));
    assert!(c.is_at_end());
    assert!(matches!(c.advance().kind, TokenKind::Eof));
    assert!(c.is_at_end());
}

#[test]
fn test_check_ignores_payload() {
    let c = cursor("foo");
    assert!(c.check(&TokenKind::Name("other".into())));
}

#[test]
fn test_eat_and_peek() {
    let mut c = cursor("( )");
    assert_eq!(c.peek_kind(), &TokenKind::RParen);
    assert!(c.eat(&TokenKind::LParen));
    assert!(!c.eat(&TokenKind::LParen));
    assert!(c.eat(&TokenKind::RParen));
}

#[test]
fn test_expect_message() {
    let mut c = cursor("x");
    let err = c.expect(&TokenKind::Then).unwrap_err();
    assert_eq!(err.message, "'then' expected near 'x'");
}

#[test]
fn test_expect_closing_names_opener() {
    let mut c = cursor("\n\n");
    let err = c
        .expect_closing(&TokenKind::End, &TokenKind::Function, 1)
        .unwrap_err();
    assert_eq!(
        err.message,
        "'end' expected (to close 'function' at line 1) near '<eof>'"
    );
}
