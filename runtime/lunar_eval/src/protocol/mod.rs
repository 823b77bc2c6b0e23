//! Metatable-aware indexing, assignment and calls.
//!
//! Lookup order on a table: a key present in storage (for scope tables, a
//! bound name even if nil), then `__index`, then the enclosing scope. The
//! metatable is consulted before the parent scope.

mod operators;

pub use operators::{binary, compare_less, equals, length, unary};

use smallvec::smallvec;

use crate::context::CallContext;
use crate::engine::Engine;
use crate::errors::{attempt_to_assign, attempt_to_call, attempt_to_index, EvalResult};
use crate::value::{first, BoxFuture, Table, Value, Values};

/// Metatable of `value`: tables carry their own, strings share the
/// engine's string metatable, other kinds have none.
pub fn metatable_of(engine: &Engine, value: &Value) -> Option<Table> {
    match value {
        Value::Table(t) => t.metatable(),
        Value::String(_) => Some(engine.string_metatable().clone()),
        _ => None,
    }
}

/// Raw lookup of `event` in the metatable of `value`; `None` when absent.
pub fn metamethod(engine: &Engine, value: &Value, event: &str) -> Option<Value> {
    let mt = metatable_of(engine, value)?;
    let handler = mt.raw_get(&Value::from(event));
    (!handler.is_nil()).then_some(handler)
}

/// `holder[key]` with metatables and scope parents.
pub fn index(
    engine: &Engine,
    holder: Value,
    key: Value,
    cx: &CallContext,
) -> BoxFuture<'static, EvalResult<Value>> {
    let engine = engine.clone();
    let cx = cx.clone();
    Box::pin(async move {
        let mut holder = holder;
        loop {
            let handler = match &holder {
                Value::Table(t) => {
                    let present = if t.is_scope() {
                        t.binds(&key)
                    } else {
                        t.is_property(&key) || t.contains_key(&key)
                    };
                    if present {
                        return t.get(&key);
                    }
                    match metamethod(&engine, &holder, "__index") {
                        Some(handler) => handler,
                        None => match t.parent() {
                            Some(parent) => {
                                holder = Value::Table(parent);
                                continue;
                            }
                            None => return Ok(Value::Nil),
                        },
                    }
                }
                Value::String(_) => match metamethod(&engine, &holder, "__index") {
                    Some(handler) => handler,
                    None => return Err(attempt_to_index(&holder)),
                },
                other => return Err(attempt_to_index(other)),
            };
            match handler {
                Value::Function(f) => {
                    let results = f.call(&engine, smallvec![holder, key], &cx).await?;
                    return Ok(first(&results));
                }
                next => holder = next,
            }
        }
    })
}

/// `holder[key] = value` with metatables and scope parents.
///
/// Updating a key already present in storage never consults
/// `__newindex`. On scope tables an unbound name is assigned in the
/// nearest enclosing scope that binds it, or in the outermost one.
pub fn new_index(
    engine: &Engine,
    holder: Value,
    key: Value,
    value: Value,
    cx: &CallContext,
) -> BoxFuture<'static, EvalResult<()>> {
    let engine = engine.clone();
    let cx = cx.clone();
    Box::pin(async move {
        let mut holder = holder;
        loop {
            let Value::Table(t) = &holder else {
                return Err(attempt_to_assign(&holder));
            };
            let present = if t.is_scope() {
                t.binds(&key)
            } else {
                t.is_property(&key) || t.contains_key(&key)
            };
            if present {
                return t.set(key, value);
            }
            match metamethod(&engine, &holder, "__newindex") {
                Some(Value::Function(f)) => {
                    f.call(&engine, smallvec![holder.clone(), key, value], &cx)
                        .await?;
                    return Ok(());
                }
                Some(next) => holder = next,
                None => match t.parent() {
                    Some(parent) => holder = Value::Table(parent),
                    None => return t.set(key, value),
                },
            }
        }
    })
}

/// Invoke `callee`, going through `__call` for non-functions.
pub fn call(
    engine: &Engine,
    callee: &Value,
    args: Values,
    cx: &CallContext,
) -> BoxFuture<'static, EvalResult<Values>> {
    match callee {
        Value::Function(f) => f.call(engine, args, cx),
        other => match metamethod(engine, other, "__call") {
            Some(Value::Function(handler)) => {
                let mut full = Values::with_capacity(args.len() + 1);
                full.push(other.clone());
                full.extend(args);
                handler.call(engine, full, cx)
            }
            _ => {
                let err = attempt_to_call(other);
                Box::pin(async move { Err(err) })
            }
        },
    }
}

/// Whether a table can be invoked through `__call`.
pub fn is_callable(table: &Table) -> bool {
    table
        .metatable()
        .is_some_and(|mt| matches!(mt.raw_get(&Value::from("__call")), Value::Function(_)))
}

/// `tostring(v)`, honoring `__tostring`.
pub async fn tostring(engine: &Engine, value: &Value, cx: &CallContext) -> EvalResult<Value> {
    if let Some(handler) = metamethod(engine, value, "__tostring") {
        if !matches!(value, Value::String(_)) {
            let results = call(engine, &handler, smallvec![value.clone()], cx).await?;
            return Ok(first(&results));
        }
    }
    Ok(Value::String(value.as_string()))
}

#[cfg(test)]
mod tests;
