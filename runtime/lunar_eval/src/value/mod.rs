//! Runtime values.
//!
//! `Value` is a closed tagged union. Reference kinds (tables, functions,
//! userdata) are cheap `Arc` handles compared by a stable identity token
//! assigned at creation, so handles obtained at different times compare
//! equal when they refer to the same object.

mod function;
mod number;
mod table;
mod userdata;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

pub use function::{
    AsyncNativeFn, BoxFuture, Closure, Function, FunctionKind, NativeFn,
};
pub use number::{format_number, parse_number};
pub(crate) use function::FunctionInner;
pub(crate) use table::TableInner;
pub use table::{ProxyBinding, Table};
pub use userdata::UserData;

/// Argument and result lists. Most calls pass at most two values.
pub type Values = SmallVec<[Value; 2]>;

/// Identity token for reference values.
pub(crate) fn next_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0x0010_0000);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Kind tag of a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Number,
    String,
    UserData,
    Function,
    /// Reserved; no value of this kind is ever created.
    Thread,
    Table,
}

impl ValueKind {
    /// Lower-cased kind name, as returned by `type(x)`.
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::UserData => "userdata",
            ValueKind::Function => "function",
            ValueKind::Thread => "thread",
            ValueKind::Table => "table",
        }
    }
}

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    String(Arc<str>),
    UserData(UserData),
    Function(Function),
    Table(Table),
}

impl Value {
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        Value::Boolean(b)
    }

    #[inline]
    pub fn from_number(n: f64) -> Self {
        Value::Number(n)
    }

    pub fn from_string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::UserData(_) => ValueKind::UserData,
            Value::Function(_) => ValueKind::Function,
            Value::Table(_) => ValueKind::Table,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Truthiness: only `nil` and `false` are falsy.
    #[inline]
    pub fn as_bool(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Numeric conversion; NaN when the value is not convertible.
    ///
    /// Strings holding a numeral convert. Callers that must tell a failed
    /// conversion from a real NaN use [`Value::to_number`].
    pub fn as_number(&self) -> f64 {
        self.to_number().unwrap_or(f64::NAN)
    }

    /// Numeric conversion, `None` when not convertible.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    /// String view of strings only.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// String coercion used by the string library: strings as-is, numbers
    /// formatted, everything else `None`.
    pub fn coerce_string(&self) -> Option<Arc<str>> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(Arc::from(format_number(*n))),
            _ => None,
        }
    }

    /// String conversion without metamethods (`table: 0x...` for tables).
    pub fn as_string(&self) -> Arc<str> {
        match self {
            Value::String(s) => s.clone(),
            other => Arc::from(other.to_string()),
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Raw equality: same kind, then value equality for primitives and
    /// identity for reference kinds. NaN is not equal to itself.
    pub fn raw_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.id() == b.id(),
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            (Value::UserData(a), Value::UserData(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.raw_equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Table(t) => write!(f, "table: 0x{:08x}", t.id()),
            Value::Function(func) => write!(f, "function: 0x{:08x}", func.id()),
            Value::UserData(u) => write!(f, "userdata: 0x{:08x}", u.id()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<UserData> for Value {
    fn from(u: UserData) -> Self {
        Value::UserData(u)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}

/// First value of a result list, or nil.
pub fn first(values: &[Value]) -> Value {
    values.first().cloned().unwrap_or_default()
}
