//! Raw token definitions for logos.

use logos::{Lexer, Logos};

use crate::escape::{long_bracket_close, long_bracket_level, unescape};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f\v]+")]
pub(crate) enum RawToken {
    // === Comments ===
    #[token("--", comment)]
    Comment,

    // === Keywords ===
    #[token("and")]
    And,
    #[token("break")]
    Break,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("elseif")]
    Elseif,
    #[token("end")]
    End,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("in")]
    In,
    #[token("local")]
    Local,
    #[token("nil")]
    Nil,
    #[token("not")]
    Not,
    #[token("or")]
    Or,
    #[token("repeat")]
    Repeat,
    #[token("return")]
    Return,
    #[token("then")]
    Then,
    #[token("true")]
    True,
    #[token("until")]
    Until,
    #[token("while")]
    While,

    // === Symbols ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("#")]
    Hash,
    #[token("==")]
    EqEq,
    #[token("~=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("...")]
    Ellipsis,

    // === Literals ===
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", hex_number)]
    Number(f64),

    #[regex(r#""([^"\\\n]|\\z\s*|\\(.|\n))*""#, quoted)]
    #[regex(r"'([^'\\\n]|\\z\s*|\\(.|\n))*'", quoted)]
    Str(String),

    #[regex(r"\[=*\[", long_string)]
    LongStr(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Name,
}

fn hex_number(lex: &mut Lexer<RawToken>) -> Option<f64> {
    let digits = &lex.slice()[2..];
    let mut value = 0f64;
    for d in digits.chars() {
        value = value * 16.0 + f64::from(d.to_digit(16)?);
    }
    Some(value)
}

fn quoted(lex: &mut Lexer<RawToken>) -> Option<String> {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

fn long_string(lex: &mut Lexer<RawToken>) -> Option<String> {
    let level = lex.slice().len() - 2;
    let close = long_bracket_close(level);
    let rest = lex.remainder();
    let end = rest.find(&close)?;
    let body = &rest[..end];
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body)
        .to_string();
    lex.bump(end + close.len());
    Some(body)
}

fn comment(lex: &mut Lexer<RawToken>) -> bool {
    let rest = lex.remainder();
    if let Some(level) = long_bracket_level(rest) {
        let open_len = level + 2;
        let close = long_bracket_close(level);
        match rest[open_len..].find(&close) {
            Some(end) => {
                lex.bump(open_len + end + close.len());
                true
            }
            None => {
                lex.bump(rest.len());
                false
            }
        }
    } else {
        let end = rest.find('\n').unwrap_or(rest.len());
        lex.bump(end);
        true
    }
}
