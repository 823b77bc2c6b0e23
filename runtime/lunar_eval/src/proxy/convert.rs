//! Conversions between host values and script values.

use std::any::{type_name, Any};
use std::sync::Arc;

use smallvec::smallvec;

use crate::engine::Engine;
use crate::errors::{unsupported_conversion, EvalResult};
use crate::value::{Function, Table, UserData, Value, Values};

/// Host return values that become a script result list.
pub trait IntoValues {
    fn into_values(self) -> Values;
}

impl IntoValues for () {
    fn into_values(self) -> Values {
        Values::new()
    }
}

impl IntoValues for Values {
    fn into_values(self) -> Values {
        self
    }
}

impl IntoValues for Vec<Value> {
    fn into_values(self) -> Values {
        Values::from_vec(self)
    }
}

macro_rules! single_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValues for $ty {
                fn into_values(self) -> Values {
                    smallvec![Value::from(self)]
                }
            }
        )*
    };
}

single_value!(Value, bool, f64, i32, u32, i64, usize, &str, String, Arc<str>, Table, Function, UserData);

impl<T: Into<Value>> IntoValues for Option<T> {
    fn into_values(self) -> Values {
        smallvec![self.map_or(Value::Nil, Into::into)]
    }
}

impl<A: Into<Value>, B: Into<Value>> IntoValues for (A, B) {
    fn into_values(self) -> Values {
        smallvec![self.0.into(), self.1.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> IntoValues for (A, B, C) {
    fn into_values(self) -> Values {
        smallvec![self.0.into(), self.1.into(), self.2.into()]
    }
}

/// Convert a host object by its runtime type.
///
/// Value kinds and primitive host types convert directly. An instance of a
/// type with a built class descriptor becomes a proxy. Anything else is an
/// `UnsupportedConversion` error.
pub fn from_host_object<T: Any + Send + Sync>(engine: &Engine, object: Arc<T>) -> EvalResult<Value> {
    let object: Arc<dyn Any + Send + Sync> = object;
    if let Some(value) = primitive(&*object) {
        return Ok(value);
    }
    match super::cached_descriptor((*object).type_id()) {
        Some(class) => Ok(Value::Table(engine.proxy_with(object, class))),
        None => Err(unsupported_conversion(type_name::<T>())),
    }
}

fn primitive(object: &(dyn Any + Send + Sync)) -> Option<Value> {
    macro_rules! try_downcast {
        ($($ty:ty),*) => {
            $(
                if let Some(v) = object.downcast_ref::<$ty>() {
                    return Some(Value::from(v.clone()));
                }
            )*
        };
    }
    try_downcast!(Value, bool, f64, i32, u32, i64, usize, String, Arc<str>, Table, Function, UserData);
    if let Some(v) = object.downcast_ref::<&'static str>() {
        return Some(Value::from(*v));
    }
    if let Some(v) = object.downcast_ref::<f32>() {
        return Some(Value::Number(f64::from(*v)));
    }
    None
}
