//! `bit32`: unsigned 32-bit operations on numbers.

use crate::engine::Engine;
use crate::errors::{bad_argument, bad_argument_type, EvalResult};
use crate::proxy::{ClassBuilder, HostCall, ProxyClass, Signature};

pub struct Bit32Lib;

pub(super) fn install(engine: &Engine) {
    engine.register_class::<Bit32Lib>("bit32");
}

/// Numbers wrap modulo 2^32, as in Lua 5.2.
fn to_u32(n: f64) -> u32 {
    if n.is_finite() {
        (n.floor() as i64).rem_euclid(1 << 32) as u32
    } else {
        0
    }
}

fn all_args(call: &HostCall, name: &str) -> EvalResult<Vec<u32>> {
    call.arguments(0)
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.to_number()
                .map(to_u32)
                .ok_or_else(|| bad_argument_type(i + 1, name, "number", Some(v)))
        })
        .collect()
}

fn shift_left(x: u32, disp: i64) -> u32 {
    match disp {
        d if d <= -32 || d >= 32 => 0,
        d if d >= 0 => x << d,
        d => x >> -d,
    }
}

fn shift_right(x: u32, disp: i64) -> u32 {
    shift_left(x, disp.saturating_neg())
}

impl ProxyClass for Bit32Lib {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .static_method("band", Signature::new().arguments(), |call: HostCall| {
                Ok(all_args(&call, "band")?.into_iter().fold(u32::MAX, |a, b| a & b))
            })
            .static_method("bor", Signature::new().arguments(), |call: HostCall| {
                Ok(all_args(&call, "bor")?.into_iter().fold(0, |a, b| a | b))
            })
            .static_method("bxor", Signature::new().arguments(), |call: HostCall| {
                Ok(all_args(&call, "bxor")?.into_iter().fold(0, |a, b| a ^ b))
            })
            .static_method("btest", Signature::new().arguments(), |call: HostCall| {
                Ok(all_args(&call, "btest")?.into_iter().fold(u32::MAX, |a, b| a & b) != 0)
            })
            .static_method("bnot", Signature::new().number(), |call: HostCall| {
                Ok(!to_u32(call.number(0)))
            })
            .static_method("lshift", Signature::new().number().integer(), |call: HostCall| {
                Ok(shift_left(to_u32(call.number(0)), call.integer(1)))
            })
            .static_method("rshift", Signature::new().number().integer(), |call: HostCall| {
                Ok(shift_right(to_u32(call.number(0)), call.integer(1)))
            })
            .static_method("arshift", Signature::new().number().integer(), |call: HostCall| {
                let x = to_u32(call.number(0));
                let disp = call.integer(1);
                if disp < 0 || x & 0x8000_0000 == 0 {
                    return Ok(shift_right(x, disp));
                }
                // sign-fill from the left
                Ok(if disp >= 32 {
                    u32::MAX
                } else {
                    ((x as i32) >> disp) as u32
                })
            })
            .static_method("lrotate", Signature::new().number().integer(), |call: HostCall| {
                Ok(to_u32(call.number(0)).rotate_left(call.integer(1).rem_euclid(32) as u32))
            })
            .static_method("rrotate", Signature::new().number().integer(), |call: HostCall| {
                Ok(to_u32(call.number(0)).rotate_right(call.integer(1).rem_euclid(32) as u32))
            })
            .static_method(
                "extract",
                Signature::new().number().integer().optional_integer(1.0),
                |call: HostCall| {
                    let n = to_u32(call.number(0));
                    let field = call.integer(1);
                    let width = call.integer(2);
                    if !(0..32).contains(&field) || width < 1 || field + width > 32 {
                        return Err(bad_argument(2, "extract", "trying to access non-existent bits"));
                    }
                    let mask = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
                    Ok((n >> field) & mask)
                },
            )
    }
}
