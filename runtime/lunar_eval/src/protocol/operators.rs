//! Operator dispatch: metamethods first, then built-in semantics.

use std::cmp::Ordering;

use lunar_ir::{BinaryOp, UnaryOp};
use smallvec::smallvec;

use super::{call, metamethod};
use crate::context::CallContext;
use crate::engine::Engine;
use crate::errors::{arithmetic_on, attempt_length_of, attempt_to_compare, EvalResult};
use crate::value::{first, Value};

/// Metamethod consulted for `op`, and whether its operands are swapped.
///
/// `~=` uses `__eq` and negates it; `>` and `>=` use `__lt` and `__le`
/// with the operands swapped.
fn event(op: BinaryOp) -> Option<(&'static str, bool)> {
    let event = match op {
        BinaryOp::Add => ("__add", false),
        BinaryOp::Sub => ("__sub", false),
        BinaryOp::Mul => ("__mul", false),
        BinaryOp::Div => ("__div", false),
        BinaryOp::Mod => ("__mod", false),
        BinaryOp::Pow => ("__pow", false),
        BinaryOp::Concat => ("__concat", false),
        BinaryOp::Eq | BinaryOp::NotEq => ("__eq", false),
        BinaryOp::Lt => ("__lt", false),
        BinaryOp::LtEq => ("__le", false),
        BinaryOp::Gt => ("__lt", true),
        BinaryOp::GtEq => ("__le", true),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(event)
}

/// Evaluate `left op right` with both operands already evaluated.
///
/// `and`/`or` are handled here too, returning the deciding operand, but
/// the evaluator short-circuits them before the right side is evaluated.
pub async fn binary(
    engine: &Engine,
    op: BinaryOp,
    left: Value,
    right: Value,
    cx: &CallContext,
) -> EvalResult<Value> {
    if let (Value::Number(a), Value::Number(b)) = (&left, &right) {
        if let Some(value) = number_binary(op, *a, *b) {
            return Ok(value);
        }
    }

    if let Some((name, swapped)) = event(op) {
        let raw_equal = matches!(op, BinaryOp::Eq | BinaryOp::NotEq) && left.raw_equals(&right);
        if !raw_equal {
            let handler =
                metamethod(engine, &left, name).or_else(|| metamethod(engine, &right, name));
            if let Some(handler) = handler {
                let args = if swapped {
                    smallvec![right, left]
                } else {
                    smallvec![left, right]
                };
                let result = first(&call(engine, &handler, args, cx).await?);
                return Ok(match op {
                    BinaryOp::Eq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                        Value::Boolean(result.as_bool())
                    }
                    BinaryOp::NotEq => Value::Boolean(!result.as_bool()),
                    _ => result,
                });
            }
        }
    }

    builtin_binary(op, left, right)
}

fn number_binary(op: BinaryOp, a: f64, b: f64) -> Option<Value> {
    let value = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Mod => Value::Number(a % b),
        BinaryOp::Pow => Value::Number(a.powf(b)),
        BinaryOp::Eq => Value::Boolean(a == b),
        BinaryOp::NotEq => Value::Boolean(a != b),
        BinaryOp::Lt => Value::Boolean(a < b),
        BinaryOp::LtEq => Value::Boolean(a <= b),
        BinaryOp::Gt => Value::Boolean(a > b),
        BinaryOp::GtEq => Value::Boolean(a >= b),
        BinaryOp::Concat | BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(value)
}

fn builtin_binary(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Concat => {
            let mut s = String::from(&*left.as_string());
            s.push_str(&right.as_string());
            Ok(Value::from(s))
        }
        BinaryOp::And => Ok(if left.as_bool() { right } else { left }),
        BinaryOp::Or => Ok(if left.as_bool() { left } else { right }),
        BinaryOp::Eq => Ok(Value::Boolean(left.raw_equals(&right))),
        BinaryOp::NotEq => Ok(Value::Boolean(!left.raw_equals(&right))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare_less(&left, &right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Some(Ordering::Less),
                BinaryOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => ordering == Some(Ordering::Greater),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => {
            let a = left.to_number().ok_or_else(|| arithmetic_on(&left))?;
            let b = right.to_number().ok_or_else(|| arithmetic_on(&right))?;
            number_binary(op, a, b).ok_or_else(|| arithmetic_on(&left))
        }
    }
}

/// Ordering of two numbers or two strings (byte-wise).
///
/// `None` when either number is NaN. Mixed kinds are a `TypeMismatch`.
pub fn compare_less(left: &Value, right: &Value) -> EvalResult<Option<Ordering>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.as_bytes().cmp(b.as_bytes()))),
        _ => Err(attempt_to_compare(left, right)),
    }
}

/// `left == right`, honoring `__eq`.
pub async fn equals(
    engine: &Engine,
    left: &Value,
    right: &Value,
    cx: &CallContext,
) -> EvalResult<bool> {
    let result = binary(engine, BinaryOp::Eq, left.clone(), right.clone(), cx).await?;
    Ok(result.as_bool())
}

/// `#value`, honoring `__len`.
///
/// Strings count characters. Tables without `__len` count their non-nil
/// raw entries.
pub async fn length(engine: &Engine, value: &Value, cx: &CallContext) -> EvalResult<Value> {
    if let Value::Table(t) = value {
        if let Some(handler) = metamethod(engine, value, "__len") {
            let results = call(engine, &handler, smallvec![value.clone()], cx).await?;
            return Ok(first(&results));
        }
        return Ok(Value::from(t.len()));
    }
    match value {
        Value::String(s) => Ok(Value::from(s.chars().count())),
        other => Err(attempt_length_of(other)),
    }
}

/// Evaluate a unary operator on an evaluated operand.
pub async fn unary(
    engine: &Engine,
    op: UnaryOp,
    operand: Value,
    cx: &CallContext,
) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!operand.as_bool())),
        UnaryOp::Len => length(engine, &operand, cx).await,
        UnaryOp::Neg => {
            if let Value::Number(n) = operand {
                return Ok(Value::Number(-n));
            }
            if let Some(handler) = metamethod(engine, &operand, "__unm") {
                let results = call(engine, &handler, smallvec![operand.clone(), operand], cx).await?;
                return Ok(first(&results));
            }
            operand
                .to_number()
                .map(|n| Value::Number(-n))
                .ok_or_else(|| arithmetic_on(&operand))
        }
    }
}
