//! `math`, exposed through the proxy bridge as a static class.

use parking_lot::Mutex;

use crate::engine::Engine;
use crate::errors::{bad_argument, bad_argument_type, EvalResult};
use crate::proxy::{ClassBuilder, HostCall, ProxyClass, Signature};
use crate::value::Value;

pub struct MathLib;

pub(super) fn install(engine: &Engine) {
    engine.register_class::<MathLib>("math");
}

macro_rules! unary_fns {
    ($class:expr; $($name:literal => $f:expr),* $(,)?) => {
        $class$(
            .static_method($name, Signature::new().number(), |call: HostCall| {
                let f: fn(f64) -> f64 = $f;
                Ok(f(call.number(0)))
            })
        )*
    };
}

impl ProxyClass for MathLib {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        let class = class
            .static_property("pi", || std::f64::consts::PI)
            .static_property("huge", || f64::INFINITY);
        let class = unary_fns!(class;
            "abs" => f64::abs,
            "acos" => f64::acos,
            "asin" => f64::asin,
            "atan" => f64::atan,
            "ceil" => f64::ceil,
            "cos" => f64::cos,
            "cosh" => f64::cosh,
            "deg" => f64::to_degrees,
            "exp" => f64::exp,
            "floor" => f64::floor,
            "log10" => f64::log10,
            "rad" => f64::to_radians,
            "sin" => f64::sin,
            "sinh" => f64::sinh,
            "sqrt" => f64::sqrt,
            "tan" => f64::tan,
            "tanh" => f64::tanh,
        );
        class
            .static_method("atan2", Signature::new().number().optional_number(1.0), |call: HostCall| {
                Ok(call.number(0).atan2(call.number(1)))
            })
            .static_method("fmod", Signature::new().number().number(), |call: HostCall| {
                Ok(call.number(0) % call.number(1))
            })
            .static_method("pow", Signature::new().number().number(), |call: HostCall| {
                Ok(call.number(0).powf(call.number(1)))
            })
            .static_method("log", Signature::new().number().optional_any(Value::Nil), |call: HostCall| {
                let x = call.number(0);
                match call.value(1).to_number() {
                    Some(base) => Ok(x.ln() / base.ln()),
                    None => Ok(x.ln()),
                }
            })
            .static_method("modf", Signature::new().number(), |call: HostCall| {
                let x = call.number(0);
                let whole = x.trunc();
                let fraction = if x.is_infinite() { 0.0 } else { x - whole };
                Ok((whole, fraction))
            })
            .static_method("max", Signature::new().number().arguments(), |call: HostCall| {
                fold(&call, "max", f64::max)
            })
            .static_method("min", Signature::new().number().arguments(), |call: HostCall| {
                fold(&call, "min", f64::min)
            })
            .static_method("isinf", Signature::new().number(), |call: HostCall| {
                Ok(call.number(0).is_infinite())
            })
            .static_method("isnan", Signature::new().number(), |call: HostCall| {
                Ok(call.number(0).is_nan())
            })
            .static_method("finite", Signature::new().number(), |call: HostCall| {
                Ok(call.number(0).is_finite())
            })
            .static_method(
                "random",
                Signature::new().optional_number(Value::Nil).optional_number(Value::Nil),
                random,
            )
            .static_method("randomseed", Signature::new().number(), |call: HostCall| {
                *RANDOM.lock() = seed_state(call.number(0));
                Ok(())
            })
    }
}

/// Fold every argument with `f`. Argument #1 is bound; the rest are
/// checked here so errors name their position.
fn fold(call: &HostCall, name: &str, f: fn(f64, f64) -> f64) -> EvalResult<f64> {
    let args = call.arguments(1);
    let mut acc = call.number(0);
    for (i, value) in args.iter().enumerate().skip(1) {
        let n = value
            .to_number()
            .ok_or_else(|| bad_argument_type(i + 1, name, "number", Some(value)))?;
        acc = f(acc, n);
    }
    Ok(acc)
}

static RANDOM: Mutex<u64> = parking_lot::const_mutex(0x853c_49e6_748f_ea9b);

fn seed_state(seed: f64) -> u64 {
    let bits = seed.to_bits() ^ 0x9e37_79b9_7f4a_7c15;
    if bits == 0 {
        1
    } else {
        bits
    }
}

/// xorshift64* in `[0, 1)`.
fn next_random() -> f64 {
    let mut state = RANDOM.lock();
    let mut x = *state;
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    *state = x;
    let out = x.wrapping_mul(0x2545_f491_4f6c_dd1d);
    (out >> 11) as f64 / (1u64 << 53) as f64
}

fn random(call: HostCall) -> EvalResult<f64> {
    let r = next_random();
    let (lo, hi) = match (call.value(0).to_number(), call.value(1).to_number()) {
        (None, _) => return Ok(r),
        (Some(m), None) => (1.0, m.floor()),
        (Some(m), Some(n)) => (m.floor(), n.floor()),
    };
    if lo > hi {
        let position = if call.value(1).is_nil() { 1 } else { 2 };
        return Err(bad_argument(position, "random", "interval is empty"));
    }
    Ok((r * (hi - lo + 1.0)).floor() + lo)
}
