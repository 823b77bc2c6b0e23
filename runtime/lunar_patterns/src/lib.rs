//! Lunar Patterns - compiles Lua string patterns to `regex` programs.
//!
//! The pattern dialect is translated once into regex syntax
//! ([`translate`]), then built with `dot_matches_new_line` so `.` matches
//! any character like it does in patterns.
//!
//! # Translation rules
//!
//! - `%a %d %s ...` expand to fixed bracket classes ([`class_expansion`])
//! - literal characters are escaped with `regex::escape`
//! - a positive set `[...]` gathers its magic classes and its literal
//!   characters/ranges separately; when there is more than one piece they
//!   are joined into a non-capturing alternation `(?:a|b)`
//! - a negated set `[^...]` becomes one negated class with nested classes
//! - `^` anchors only at the start and `$` only at the end; elsewhere they
//!   are literal
//! - `? * +` quantify the previous single-character item, `-` becomes the
//!   lazy `*?`; after `(`, an anchor, another quantifier, or at the start
//!   they are literal
//! - `()` is a position capture
//! - `%b`, `%f`, and back-references `%1`-`%9` fail with
//!   [`PatternError::NotImplemented`]

mod matcher;
mod translate;

pub use matcher::{Capture, LuaPattern, Matches, PatternMatch};
pub use translate::{class_expansion, translate, CaptureKind, Translation};

/// Pattern compilation failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Syntax error in the pattern itself.
    #[error("malformed pattern ({0})")]
    Malformed(&'static str),
    /// A recognized construct with no regex equivalent.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    /// The translated regex was rejected (size limits and the like).
    #[error("invalid pattern: {0}")]
    Regex(String),
}

/// Translate and build `pattern`.
pub fn compile(pattern: &str) -> Result<LuaPattern, PatternError> {
    LuaPattern::new(pattern)
}
