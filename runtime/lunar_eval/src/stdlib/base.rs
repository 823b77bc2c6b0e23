//! Global functions.

use smallvec::smallvec;

use super::{arg, check_any, check_number, check_table, opt_number};
use crate::context::CallContext;
use crate::engine::Engine;
use crate::errors::{bad_argument, bad_argument_type, metatable_error, user_raised, EvalResult};
use crate::protocol;
use crate::value::{Function, Table, Value, Values};

pub(super) fn install(engine: &Engine) {
    let globals = engine.globals();
    globals.set_field("_G", globals.clone());
    globals.set_field("_VERSION", "Lua 5.1");

    let sync: [(&str, fn(&Engine, Values, &CallContext) -> EvalResult<Values>); 11] = [
        ("assert", assert),
        ("error", error),
        ("getmetatable", getmetatable),
        ("setmetatable", setmetatable),
        ("rawequal", rawequal),
        ("rawget", rawget),
        ("rawset", rawset),
        ("rawlen", rawlen),
        ("tonumber", tonumber),
        ("type", type_of),
        ("select", select),
    ];
    for (name, f) in sync {
        globals.set_field(name, Function::native_with_engine(name, f));
    }
    globals.set_field("unpack", Function::native_with_engine("unpack", unpack));

    let next = Function::native_with_engine("next", next);
    globals.set_field("next", next.clone());

    globals.set_field(
        "tostring",
        Function::native_async("tostring", |engine, args, cx| async move {
            let value = check_any(&args, 0, "tostring")?;
            Ok(smallvec![protocol::tostring(&engine, &value, &cx).await?])
        }),
    );
    globals.set_field(
        "print",
        Function::native_async("print", |engine, args, cx| async move {
            let mut line = String::new();
            for (i, value) in args.iter().enumerate() {
                if i > 0 {
                    line.push('\t');
                }
                line.push_str(&protocol::tostring(&engine, value, &cx).await?.as_string());
            }
            engine.print_handler().println(&line);
            Ok(Values::new())
        }),
    );
    globals.set_field(
        "pcall",
        Function::native_async("pcall", |engine, args, cx| async move {
            let callee = check_any(&args, 0, "pcall")?;
            let rest: Values = args.iter().skip(1).cloned().collect();
            match protocol::call(&engine, &callee, rest, &cx).await {
                Ok(results) => {
                    let mut out = Values::with_capacity(results.len() + 1);
                    out.push(Value::Boolean(true));
                    out.extend(results);
                    Ok(out)
                }
                Err(err) if err.is_cancellation() => Err(err),
                Err(err) => Ok(smallvec![Value::Boolean(false), err.to_value()]),
            }
        }),
    );

    let ipairs_step = Function::native_async("ipairs_iterator", |engine, args, cx| async move {
        let index = arg(&args, 1).as_number() + 1.0;
        let value = protocol::index(&engine, arg(&args, 0), Value::Number(index), &cx).await?;
        Ok(if value.is_nil() {
            smallvec![Value::Nil]
        } else {
            smallvec![Value::Number(index), value]
        })
    });
    globals.set_field(
        "ipairs",
        Function::native_async("ipairs", move |engine, args, cx| {
            let step = ipairs_step.clone();
            async move {
                let subject = check_any(&args, 0, "ipairs")?;
                if let Some(handler) = protocol::metamethod(&engine, &subject, "__ipairs") {
                    return protocol::call(&engine, &handler, args, &cx).await;
                }
                check_table(&args, 0, "ipairs")?;
                Ok(smallvec![Value::Function(step), subject, Value::Number(0.0)])
            }
        }),
    );
    globals.set_field(
        "pairs",
        Function::native_async("pairs", move |engine, args, cx| {
            let next = next.clone();
            async move {
                let subject = check_any(&args, 0, "pairs")?;
                if let Some(handler) = protocol::metamethod(&engine, &subject, "__pairs") {
                    return protocol::call(&engine, &handler, args, &cx).await;
                }
                check_table(&args, 0, "pairs")?;
                Ok(smallvec![Value::Function(next), subject, Value::Nil])
            }
        }),
    );
}

fn assert(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    if arg(&args, 0).as_bool() {
        return Ok(args);
    }
    match args.get(1) {
        Some(message) if !message.is_nil() => Err(user_raised(message.clone())),
        _ => Err(user_raised(Value::from("assertion failed!"))),
    }
}

fn error(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    Err(user_raised(arg(&args, 0)))
}

fn getmetatable(engine: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let Some(mt) = protocol::metatable_of(engine, &arg(&args, 0)) else {
        return Ok(smallvec![Value::Nil]);
    };
    let protected = mt.raw_get(&Value::from("__metatable"));
    if protected.is_nil() {
        Ok(smallvec![Value::Table(mt)])
    } else {
        Ok(smallvec![protected])
    }
}

fn setmetatable(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let table = check_table(&args, 0, "setmetatable")?;
    let metatable = match arg(&args, 1) {
        Value::Nil => None,
        Value::Table(mt) => Some(mt),
        other => {
            return Err(metatable_error(format!(
                "bad argument #2 to 'setmetatable' (nil or table expected, got {})",
                other.type_name()
            )))
        }
    };
    if let Some(current) = table.metatable() {
        if !current.raw_get(&Value::from("__metatable")).is_nil() {
            return Err(metatable_error("cannot change a protected metatable"));
        }
    }
    table.set_metatable(metatable)?;
    Ok(smallvec![Value::Table(table)])
}

fn rawequal(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let a = check_any(&args, 0, "rawequal")?;
    let b = check_any(&args, 1, "rawequal")?;
    Ok(smallvec![Value::Boolean(a.raw_equals(&b))])
}

fn rawget(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let table = check_table(&args, 0, "rawget")?;
    Ok(smallvec![table.raw_get(&arg(&args, 1))])
}

fn rawset(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let table = check_table(&args, 0, "rawset")?;
    table.raw_set(arg(&args, 1), arg(&args, 2))?;
    Ok(smallvec![Value::Table(table)])
}

fn rawlen(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    match args.first() {
        Some(Value::Table(t)) => Ok(smallvec![Value::from(t.len())]),
        Some(Value::String(s)) => Ok(smallvec![Value::from(s.chars().count())]),
        other => Err(bad_argument_type(1, "rawlen", "table or string", other)),
    }
}

fn tonumber(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let value = check_any(&args, 0, "tonumber")?;
    let base = opt_number(&args, 1, "tonumber", 10.0)?;
    if base == 10.0 {
        return Ok(smallvec![Value::from(value.to_number())]);
    }
    if !(2.0..=36.0).contains(&base) {
        return Err(bad_argument(2, "tonumber", "base out of range"));
    }
    let text = value
        .coerce_string()
        .ok_or_else(|| bad_argument_type(1, "tonumber", "string", Some(&value)))?;
    let parsed = i64::from_str_radix(text.trim(), base as u32).ok();
    Ok(smallvec![Value::from(parsed)])
}

fn type_of(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let value = check_any(&args, 0, "type")?;
    Ok(smallvec![Value::from(value.type_name())])
}

fn select(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let selector = check_any(&args, 0, "select")?;
    let count = args.len() - 1;
    if selector.as_str() == Some("#") {
        return Ok(smallvec![Value::from(count)]);
    }
    let n = check_number(&args, 0, "select")? as i64;
    let start = if n < 0 { count as i64 + n } else { n - 1 };
    if n == 0 || start < 0 {
        return Err(bad_argument(1, "select", "index out of range"));
    }
    Ok(args.iter().skip(1 + start as usize).cloned().collect())
}

/// Most values a single `unpack` call returns.
const MAX_UNPACK: i64 = 1_000_000;

fn unpack(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let table = check_table(&args, 0, "unpack")?;
    let i = opt_number(&args, 1, "unpack", 1.0)? as i64;
    let j = opt_number(&args, 2, "unpack", table.len() as f64)? as i64;
    if i > j {
        return Ok(Values::new());
    }
    if j.checked_sub(i).map_or(true, |span| span >= MAX_UNPACK) {
        return Err(bad_argument(1, "unpack", "too many results to unpack"));
    }
    Ok((i..=j)
        .map(|k| table.raw_get(&Value::from(k)))
        .collect())
}

/// `next(t, k)`. Proxies iterate their enumerable keys, which include
/// readable host properties.
fn next(_: &Engine, args: Values, _: &CallContext) -> EvalResult<Values> {
    let table = check_table(&args, 0, "next")?;
    let key = arg(&args, 1);
    if table.proxy_binding().is_some() {
        return next_proxy_key(&table, &key);
    }
    match table.next(&key)? {
        Some((k, v)) => Ok(smallvec![k, v]),
        None => Ok(Values::new()),
    }
}

fn next_proxy_key(table: &Table, key: &Value) -> EvalResult<Values> {
    let keys = table.keys();
    let position = if key.is_nil() {
        0
    } else {
        match keys.iter().position(|k| k == key) {
            Some(i) => i + 1,
            None => return Err(bad_argument(2, "next", "invalid key to 'next'")),
        }
    };
    match keys.get(position) {
        Some(k) => {
            let value = table.get(k)?;
            Ok(smallvec![k.clone(), value])
        }
        None => Ok(Values::new()),
    }
}
