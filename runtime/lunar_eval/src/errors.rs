//! Runtime error types.
//!
//! `ErrorKind` is the closed set of error categories a script can observe.
//! Factory functions (`attempt_to_call(..)`, `arithmetic_on(..)`) are the
//! construction API; they fill in both the kind and the message.

use std::fmt;

use lunar_parse::ParseError;

use crate::value::Value;

/// Result of an evaluation step.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Category of a runtime error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotIndexable,
    NotCallable,
    NotAssignable,
    /// Comparison or ordering across incompatible kinds.
    TypeMismatch,
    ArithmeticOnNonNumber,
    BadSelfArgument,
    ArgumentCountMismatch,
    BadArgumentType,
    MetatableTypeError,
    UnsupportedNode,
    NotImplemented,
    /// `error(...)` or a failed `assert(...)`.
    UserRaised,
    /// A host object of an unregistered type crossed into the runtime.
    UnsupportedConversion,
    /// The configured call depth was exceeded.
    StackOverflow,
    /// The execution's cancellation signal fired.
    ///
    /// Never surfaced by `Engine::execute*`; a cancelled execution returns
    /// `Ok` with the results gathered so far. `pcall` does not catch it.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotIndexable => "not indexable",
            ErrorKind::NotCallable => "not callable",
            ErrorKind::NotAssignable => "not assignable",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::ArithmeticOnNonNumber => "arithmetic on non-number",
            ErrorKind::BadSelfArgument => "bad self argument",
            ErrorKind::ArgumentCountMismatch => "argument count mismatch",
            ErrorKind::BadArgumentType => "bad argument type",
            ErrorKind::MetatableTypeError => "metatable type error",
            ErrorKind::UnsupportedNode => "unsupported node",
            ErrorKind::NotImplemented => "not implemented",
            ErrorKind::UserRaised => "user error",
            ErrorKind::UnsupportedConversion => "unsupported conversion",
            ErrorKind::StackOverflow => "stack overflow",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A script-catchable runtime error.
#[derive(Clone, Debug)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// The value passed to `error(v)`, when raised from script.
    pub value: Option<Value>,
    /// Line of the innermost statement that was executing.
    pub line: Option<u32>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            value: None,
            line: None,
        }
    }

    /// Record the executing line. The innermost line wins.
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        if self.line.is_none() && line > 0 {
            self.line = Some(line);
        }
        self
    }

    /// Append a parenthesized hint, e.g. `(global 'x')`.
    #[must_use]
    pub fn with_hint(mut self, hint: &str) -> Self {
        self.message.push_str(" (");
        self.message.push_str(hint);
        self.message.push(')');
        self
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// The value a protected call hands back to the script.
    pub fn to_value(&self) -> Value {
        match &self.value {
            Some(value) => value.clone(),
            None => Value::from(self.to_string()),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Any failure from `Engine::execute`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Parse(_) => None,
            Error::Runtime(err) => Some(err.kind),
        }
    }
}

// Factory functions

#[cold]
pub fn attempt_to_index(value: &Value) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::NotIndexable,
        format!("attempt to index a {} value", value.type_name()),
    )
}

#[cold]
pub fn attempt_to_assign(value: &Value) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::NotAssignable,
        format!("attempt to index a {} value", value.type_name()),
    )
}

#[cold]
pub fn attempt_to_call(value: &Value) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::NotCallable,
        format!("attempt to call a {} value", value.type_name()),
    )
}

#[cold]
pub fn invalid_key(reason: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::NotAssignable, format!("table index is {reason}"))
}

#[cold]
pub fn attempt_to_compare(left: &Value, right: &Value) -> RuntimeError {
    let (l, r) = (left.type_name(), right.type_name());
    let message = if l == r {
        format!("attempt to compare two {l} values")
    } else {
        format!("attempt to compare {l} with {r}")
    };
    RuntimeError::new(ErrorKind::TypeMismatch, message)
}

#[cold]
pub fn attempt_length_of(value: &Value) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::TypeMismatch,
        format!("attempt to get length of a {} value", value.type_name()),
    )
}

#[cold]
pub fn arithmetic_on(value: &Value) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::ArithmeticOnNonNumber,
        format!("attempt to perform arithmetic on a {} value", value.type_name()),
    )
}

#[cold]
pub fn bad_self_argument(function: &str, expected: &str, got: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::BadSelfArgument,
        format!("bad argument #1 to '{function}' (calling '{function}' on bad self: {expected} expected, got {got})"),
    )
}

#[cold]
pub fn argument_count(expected: usize, got: usize) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::ArgumentCountMismatch,
        format!("expected {expected} arguments, got {got} instead"),
    )
}

#[cold]
pub fn bad_argument(position: usize, function: &str, detail: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::BadArgumentType,
        format!("bad argument #{position} to '{function}' ({detail})"),
    )
}

/// `bad argument #n to 'f' (number expected, got nil)`
#[cold]
pub fn bad_argument_type(
    position: usize,
    function: &str,
    expected: &str,
    got: Option<&Value>,
) -> RuntimeError {
    let got = got.map_or("no value", Value::type_name);
    bad_argument(position, function, &format!("{expected} expected, got {got}"))
}

#[cold]
pub fn metatable_error(message: impl Into<String>) -> RuntimeError {
    RuntimeError::new(ErrorKind::MetatableTypeError, message)
}

#[cold]
pub fn unsupported_node(what: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::UnsupportedNode,
        format!("'{what}' is not supported"),
    )
}

#[cold]
pub fn not_implemented(feature: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::NotImplemented,
        format!("{feature} is not implemented"),
    )
}

/// `error(value)` from script.
#[cold]
pub fn user_raised(value: Value) -> RuntimeError {
    let message = match &value {
        Value::String(s) => s.to_string(),
        Value::Nil => "nil".to_string(),
        other => format!("(error object is a {} value)", other.type_name()),
    };
    RuntimeError {
        kind: ErrorKind::UserRaised,
        message,
        value: Some(value),
        line: None,
    }
}

#[cold]
pub fn unsupported_conversion(type_name: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::UnsupportedConversion,
        format!("cannot convert host value of type '{type_name}' to a script value"),
    )
}

#[cold]
pub fn stack_overflow(limit: usize) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::StackOverflow,
        format!("stack overflow (more than {limit} nested calls)"),
    )
}

#[cold]
pub fn cancelled() -> RuntimeError {
    RuntimeError::new(ErrorKind::Cancelled, "execution cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_innermost_line_wins() {
        let err = arithmetic_on(&Value::Nil).at_line(3).at_line(9);
        assert_eq!(err.line, Some(3));
        assert_eq!(err.to_string(), "line 3: attempt to perform arithmetic on a nil value");
    }

    #[test]
    fn test_hint_is_parenthesized() {
        let err = attempt_to_call(&Value::Nil).with_hint("global 'foo'");
        assert_eq!(err.message, "attempt to call a nil value (global 'foo')");
        assert_eq!(err.kind, ErrorKind::NotCallable);
    }

    #[test]
    fn test_user_raised_keeps_value() {
        let err = user_raised(Value::from(42.0));
        assert_eq!(err.to_value(), Value::from(42.0));
        assert_eq!(err.message, "(error object is a number value)");
    }

    #[test]
    fn test_compare_messages() {
        let err = attempt_to_compare(&Value::Nil, &Value::from(1.0));
        assert_eq!(err.message, "attempt to compare nil with number");
        let err = attempt_to_compare(&Value::Boolean(true), &Value::Boolean(false));
        assert_eq!(err.message, "attempt to compare two boolean values");
    }

    #[test]
    fn test_argument_errors() {
        assert_eq!(argument_count(2, 1).message, "expected 2 arguments, got 1 instead");
        let err = bad_argument_type(2, "greet", "string", Some(&Value::Nil));
        assert_eq!(err.message, "bad argument #2 to 'greet' (string expected, got nil)");
    }
}
