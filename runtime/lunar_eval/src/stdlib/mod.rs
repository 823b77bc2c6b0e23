//! Standard libraries: base functions, `string`, `math` and `bit32`.

mod base;
mod bit32;
mod math;
mod string;

pub use bit32::Bit32Lib;
pub use math::MathLib;
pub use string::StringLib;

use crate::engine::Engine;
use crate::errors::{bad_argument_type, EvalResult};
use crate::value::{Table, Value};

pub(crate) fn install(engine: &Engine) {
    base::install(engine);
    string::install(engine);
    math::install(engine);
    bit32::install(engine);
}

// Argument helpers for natives that are not bound through a signature.

#[inline]
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

pub(crate) fn check_any(args: &[Value], index: usize, function: &str) -> EvalResult<Value> {
    args.get(index)
        .cloned()
        .ok_or_else(|| bad_argument_type(index + 1, function, "value", None))
}

pub(crate) fn check_number(args: &[Value], index: usize, function: &str) -> EvalResult<f64> {
    args.get(index)
        .and_then(Value::to_number)
        .ok_or_else(|| bad_argument_type(index + 1, function, "number", args.get(index)))
}

pub(crate) fn opt_number(
    args: &[Value],
    index: usize,
    function: &str,
    default: f64,
) -> EvalResult<f64> {
    match args.get(index) {
        None | Some(Value::Nil) => Ok(default),
        Some(_) => check_number(args, index, function),
    }
}

pub(crate) fn check_table(args: &[Value], index: usize, function: &str) -> EvalResult<Table> {
    match args.get(index) {
        Some(Value::Table(t)) => Ok(t.clone()),
        other => Err(bad_argument_type(index + 1, function, "table", other)),
    }
}
