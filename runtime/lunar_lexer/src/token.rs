//! Token kinds handed to the parser.

use std::fmt;
use std::sync::Arc;

use lunar_ir::Span;

use crate::raw::RawToken;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Token kinds with decoded payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Name(Arc<str>),
    Number(f64),
    String(Arc<str>),

    // Keywords
    And,
    Break,
    Do,
    Else,
    Elseif,
    End,
    False,
    For,
    Function,
    Goto,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,

    // Symbols
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Hash,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    Lt,
    Gt,
    Eq,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    DoubleColon,
    Colon,
    Comma,
    Dot,
    DotDot,
    Ellipsis,

    Eof,
}

impl TokenKind {
    /// Convert a raw logos token; comments produce `None`.
    pub(crate) fn from_raw(raw: RawToken, slice: &str) -> Option<Self> {
        let kind = match raw {
            RawToken::Comment => return None,
            RawToken::Name => TokenKind::Name(Arc::from(slice)),
            RawToken::Number(n) => TokenKind::Number(n),
            RawToken::Str(s) | RawToken::LongStr(s) => TokenKind::String(Arc::from(s)),
            RawToken::And => TokenKind::And,
            RawToken::Break => TokenKind::Break,
            RawToken::Do => TokenKind::Do,
            RawToken::Else => TokenKind::Else,
            RawToken::Elseif => TokenKind::Elseif,
            RawToken::End => TokenKind::End,
            RawToken::False => TokenKind::False,
            RawToken::For => TokenKind::For,
            RawToken::Function => TokenKind::Function,
            RawToken::Goto => TokenKind::Goto,
            RawToken::If => TokenKind::If,
            RawToken::In => TokenKind::In,
            RawToken::Local => TokenKind::Local,
            RawToken::Nil => TokenKind::Nil,
            RawToken::Not => TokenKind::Not,
            RawToken::Or => TokenKind::Or,
            RawToken::Repeat => TokenKind::Repeat,
            RawToken::Return => TokenKind::Return,
            RawToken::Then => TokenKind::Then,
            RawToken::True => TokenKind::True,
            RawToken::Until => TokenKind::Until,
            RawToken::While => TokenKind::While,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Caret => TokenKind::Caret,
            RawToken::Hash => TokenKind::Hash,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Eq => TokenKind::Eq,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::DoubleColon => TokenKind::DoubleColon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Dot => TokenKind::Dot,
            RawToken::DotDot => TokenKind::DotDot,
            RawToken::Ellipsis => TokenKind::Ellipsis,
        };
        Some(kind)
    }

    /// Source text used in "near '...'" parse error messages.
    pub fn display_name(&self) -> String {
        match self {
            TokenKind::Name(name) => name.to_string(),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::String(s) => s.to_string(),
            TokenKind::Eof => "<eof>".to_string(),
            other => other.symbol().to_string(),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::And => "and",
            TokenKind::Break => "break",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Elseif => "elseif",
            TokenKind::End => "end",
            TokenKind::False => "false",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::Goto => "goto",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::Local => "local",
            TokenKind::Nil => "nil",
            TokenKind::Not => "not",
            TokenKind::Or => "or",
            TokenKind::Repeat => "repeat",
            TokenKind::Return => "return",
            TokenKind::Then => "then",
            TokenKind::True => "true",
            TokenKind::Until => "until",
            TokenKind::While => "while",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::Hash => "#",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "~=",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Eq => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::DoubleColon => "::",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::Ellipsis => "...",
            TokenKind::Name(_) | TokenKind::Number(_) | TokenKind::String(_) | TokenKind::Eof => {
                ""
            }
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.display_name())
    }
}
