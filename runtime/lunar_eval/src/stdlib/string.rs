//! `string`, exposed through the proxy bridge as a static class.
//!
//! The string metatable's `__index` is the class table, so `s:upper()`
//! resolves to `string.upper(s)`. Positions are 1-based character
//! positions; negative positions count from the end.

use std::sync::Arc;

use lunar_patterns::{Capture, LuaPattern, PatternError, PatternMatch};
use parking_lot::Mutex;
use smallvec::smallvec;

use crate::engine::Engine;
use crate::errors::{bad_argument, bad_argument_type, not_implemented, EvalResult};
use crate::protocol;
use crate::proxy::{ClassBuilder, HostCall, ProxyClass, Signature};
use crate::value::{first, Function, Value, Values};

pub struct StringLib;

pub(super) fn install(engine: &Engine) {
    let class = engine.register_class::<StringLib>("string");
    engine.string_metatable().set_field("__index", class);
}

impl ProxyClass for StringLib {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .static_method(
                "Byte",
                Signature::new()
                    .string()
                    .optional_integer(1.0)
                    .optional_integer(Value::Nil),
                byte,
            )
            .static_method("Char", Signature::new().arguments(), char_from_codes)
            .static_method(
                "Find",
                Signature::new()
                    .string()
                    .string()
                    .optional_integer(1.0)
                    .optional_boolean(false),
                find,
            )
            .static_method(
                "Match",
                Signature::new().string().string().optional_integer(1.0),
                match_pattern,
            )
            .static_method("GMatch", Signature::new().string().string(), gmatch)
            .async_static_method(
                "GSub",
                Signature::new()
                    .string()
                    .string()
                    .any()
                    .optional_integer(Value::Nil),
                gsub,
            )
            .static_method("Len", Signature::new().string(), |call: HostCall| {
                Ok(call.string(0).chars().count())
            })
            .static_method("Lower", Signature::new().string(), |call: HostCall| {
                Ok(call.string(0).to_lowercase())
            })
            .static_method("Upper", Signature::new().string(), |call: HostCall| {
                Ok(call.string(0).to_uppercase())
            })
            .static_method(
                "Rep",
                Signature::new().string().integer().optional_string(""),
                rep,
            )
            .static_method("Reverse", Signature::new().string(), |call: HostCall| {
                Ok(call.string(0).chars().rev().collect::<String>())
            })
            .static_method(
                "Sub",
                Signature::new().string().integer().optional_integer(-1.0),
                sub,
            )
    }
}

// Position helpers

/// Lua's relative position: negative counts back from the end.
fn relative(pos: i64, len: usize) -> i64 {
    if pos >= 0 {
        pos
    } else {
        (len as i64 + pos + 1).max(0)
    }
}

/// Byte offset of the character at 0-based index `chars`.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(b, _)| b)
}

/// Number of characters before byte offset `byte`.
fn char_position(s: &str, byte: usize) -> usize {
    s.get(..byte).map_or(0, |prefix| prefix.chars().count())
}

/// Validated start of a search: a byte offset, or `None` past the end.
fn search_start(s: &str, init: i64) -> Option<usize> {
    let len = s.chars().count();
    let init = relative(init, len).max(1) as usize;
    (init <= len + 1).then(|| byte_offset(s, init - 1))
}

fn compile(pattern: &str, function: &str) -> EvalResult<LuaPattern> {
    lunar_patterns::compile(pattern).map_err(|err| match err {
        PatternError::NotImplemented(what) => not_implemented(what),
        other => bad_argument(2, function, &other.to_string()),
    })
}

fn capture_value(s: &str, capture: &Capture) -> Value {
    match capture {
        Capture::Text(range) => Value::from(s.get(range.clone()).unwrap_or("")),
        Capture::Position(byte) => Value::from(char_position(s, *byte) + 1),
    }
}

fn captures(s: &str, m: &PatternMatch) -> Values {
    m.values().iter().map(|c| capture_value(s, c)).collect()
}

/// Longest string `rep` will build, in bytes.
const MAX_REP_LEN: usize = 1 << 30;

const SPECIALS: &[char] = &['^', '$', '*', '+', '?', '.', '(', ')', '[', ']', '%', '-'];

// Library functions

fn byte(call: HostCall) -> EvalResult<Values> {
    let s = call.string(0);
    let len = s.chars().count();
    let i = relative(call.integer(1), len).max(1);
    let j = if call.value(2).is_nil() {
        i
    } else {
        relative(call.integer(2), len).min(len as i64)
    };
    if i > j {
        return Ok(Values::new());
    }
    Ok(s.chars()
        .skip(i as usize - 1)
        .take((j - i + 1) as usize)
        .map(|c| Value::from(u32::from(c)))
        .collect())
}

fn char_from_codes(call: HostCall) -> EvalResult<String> {
    call.arguments(0)
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let code = v
                .to_number()
                .ok_or_else(|| bad_argument_type(i + 1, "char", "number", Some(v)))?;
            u32::try_from(code as i64)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| bad_argument(i + 1, "char", "value out of range"))
        })
        .collect()
}

fn find(call: HostCall) -> EvalResult<Values> {
    let s = call.string(0);
    let pattern = call.string(1);
    let Some(start) = search_start(&s, call.integer(2)) else {
        return Ok(smallvec![Value::Nil]);
    };

    if call.boolean(3) || !pattern.contains(SPECIALS) {
        return Ok(match s[start..].find(&*pattern) {
            Some(offset) => {
                let begin = start + offset;
                smallvec![
                    Value::from(char_position(&s, begin) + 1),
                    Value::from(char_position(&s, begin + pattern.len())),
                ]
            }
            None => smallvec![Value::Nil],
        });
    }

    let compiled = compile(&pattern, "find")?;
    Ok(match compiled.match_at(&s, start) {
        Some(m) => {
            let mut out: Values = smallvec![
                Value::from(char_position(&s, m.range.start) + 1),
                Value::from(char_position(&s, m.range.end)),
            ];
            out.extend(m.captures.iter().map(|c| capture_value(&s, c)));
            out
        }
        None => smallvec![Value::Nil],
    })
}

fn match_pattern(call: HostCall) -> EvalResult<Values> {
    let s = call.string(0);
    let compiled = compile(&call.string(1), "match")?;
    let Some(start) = search_start(&s, call.integer(2)) else {
        return Ok(smallvec![Value::Nil]);
    };
    Ok(match compiled.match_at(&s, start) {
        Some(m) => captures(&s, &m),
        None => smallvec![Value::Nil],
    })
}

/// Iterator over successive matches.
fn gmatch(call: HostCall) -> EvalResult<Function> {
    let s = call.string(0);
    let compiled = compile(&call.string(1), "gmatch")?;
    let position = Mutex::new(0usize);
    Ok(Function::native("gmatch_iterator", move |_| {
        let mut pos = position.lock();
        let found = if *pos <= s.len() {
            compiled.find_at(&s, *pos)
        } else {
            None
        };
        let Some(m) = found else {
            *pos = s.len() + 1;
            return Ok(smallvec![Value::Nil]);
        };
        *pos = if m.range.is_empty() {
            s[m.range.end..]
                .chars()
                .next()
                .map_or(s.len() + 1, |c| m.range.end + c.len_utf8())
        } else {
            m.range.end
        };
        Ok(captures(&s, &m))
    }))
}

async fn gsub(call: HostCall) -> EvalResult<Values> {
    let s = call.string(0);
    let compiled = compile(&call.string(1), "gsub")?;
    let replacement = call.value(2);
    if !matches!(
        replacement,
        Value::String(_) | Value::Number(_) | Value::Table(_) | Value::Function(_)
    ) {
        return Err(bad_argument_type(
            3,
            "gsub",
            "string/function/table",
            Some(&replacement),
        ));
    }
    let limit = if call.value(3).is_nil() {
        usize::MAX
    } else {
        usize::try_from(call.integer(3)).unwrap_or(0)
    };

    let matches: Vec<PatternMatch> = compiled.matches(&s).take(limit).collect();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for m in &matches {
        out.push_str(&s[last..m.range.start]);
        let whole = &s[m.range.clone()];
        match &replacement {
            Value::String(_) | Value::Number(_) => {
                let template = replacement.coerce_string().unwrap_or_else(|| Arc::from(""));
                expand_template(&template, &s, m, &mut out)?;
            }
            Value::Table(_) => {
                let key = first(&captures(&s, m));
                let value = protocol::index(call.engine(), replacement.clone(), key, call.context())
                    .await?;
                push_replacement(&mut out, &value, whole)?;
            }
            _ => {
                let args = captures(&s, m);
                let results =
                    protocol::call(call.engine(), &replacement, args, call.context()).await?;
                push_replacement(&mut out, &first(&results), whole)?;
            }
        }
        last = m.range.end;
    }
    out.push_str(&s[last..]);
    Ok(smallvec![Value::from(out), Value::from(matches.len())])
}

/// A table or function replacement: false or nil keeps the match.
fn push_replacement(out: &mut String, value: &Value, whole: &str) -> EvalResult<()> {
    match value {
        Value::Nil | Value::Boolean(false) => out.push_str(whole),
        other => match other.coerce_string() {
            Some(text) => out.push_str(&text),
            None => {
                return Err(bad_argument(
                    3,
                    "gsub",
                    &format!("invalid replacement value (a {})", other.type_name()),
                ))
            }
        },
    }
    Ok(())
}

/// Expand `%0`-`%9` and `%%` in a replacement string.
fn expand_template(template: &str, s: &str, m: &PatternMatch, out: &mut String) -> EvalResult<()> {
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('0') => out.push_str(&s[m.range.clone()]),
            Some(d @ '1'..='9') => {
                let index = d as usize - '1' as usize;
                let values = m.values();
                let capture = values.get(index).ok_or_else(|| {
                    bad_argument(3, "gsub", &format!("invalid capture index %{d} in replacement string"))
                })?;
                out.push_str(&capture_value(s, capture).as_string());
            }
            _ => {
                return Err(bad_argument(
                    3,
                    "gsub",
                    "invalid use of '%' in replacement string",
                ))
            }
        }
    }
    Ok(())
}

fn rep(call: HostCall) -> EvalResult<String> {
    let s = call.string(0);
    let separator = call.string(2);
    let n = usize::try_from(call.integer(1)).unwrap_or(0);
    if n == 0 {
        return Ok(String::new());
    }
    let len = s
        .len()
        .checked_add(separator.len())
        .and_then(|unit| unit.checked_mul(n))
        .map(|total| total - separator.len())
        .filter(|&total| total <= MAX_REP_LEN)
        .ok_or_else(|| bad_argument(2, "rep", "resulting string too large"))?;
    let mut out = String::with_capacity(len);
    for i in 0..n {
        if i > 0 {
            out.push_str(&separator);
        }
        out.push_str(&s);
    }
    Ok(out)
}

fn sub(call: HostCall) -> EvalResult<String> {
    let s = call.string(0);
    let len = s.chars().count() as i64;
    let i = relative(call.integer(1), len as usize).max(1);
    let j = relative(call.integer(2), len as usize).min(len);
    if i > j {
        return Ok(String::new());
    }
    Ok(s.chars()
        .skip(i as usize - 1)
        .take((j - i + 1) as usize)
        .collect())
}
