//! Positional argument binding for host methods.
//!
//! A [`Signature`] lists a method's declared parameters. Binding walks it
//! left to right, consuming script arguments, except for the injected
//! kinds (`Arguments`, `Cancellation`, `Engine`), which are filled from
//! the call itself and never advance the argument cursor.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::context::{CallContext, Cancellation};
use crate::engine::Engine;
use crate::errors::{argument_count, bad_argument_type, bad_self_argument, EvalResult};
use crate::protocol;
use crate::value::{Function, Table, Value, Values};

/// Declared kind of one parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    /// Numbers and numeric strings.
    Number,
    /// A number, truncated when read.
    Integer,
    /// Strings and numbers.
    String,
    /// Any value, by truthiness.
    Boolean,
    Table,
    /// Functions, and tables that can be called.
    Function,
    /// A proxy for the given host type.
    Host { type_id: TypeId, name: &'static str },
    /// Injected: the script arguments of this call.
    Arguments,
    /// Injected: the call's cancellation signal.
    Cancellation,
    /// Injected: the calling engine.
    Engine,
}

impl ParamKind {
    pub fn is_injected(&self) -> bool {
        matches!(
            self,
            ParamKind::Arguments | ParamKind::Cancellation | ParamKind::Engine
        )
    }

    fn expected(&self) -> &'static str {
        match self {
            ParamKind::Any | ParamKind::Boolean => "value",
            ParamKind::Number | ParamKind::Integer => "number",
            ParamKind::String => "string",
            ParamKind::Table => "table",
            ParamKind::Function => "function",
            ParamKind::Host { name, .. } => *name,
            ParamKind::Arguments | ParamKind::Cancellation | ParamKind::Engine => "",
        }
    }
}

#[derive(Clone, Debug)]
struct Param {
    kind: ParamKind,
    default: Option<Value>,
}

/// Parameter list of a host method.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<Param>,
}

macro_rules! param_methods {
    ($($required:ident, $optional:ident => $kind:ident;)*) => {
        $(
            #[must_use]
            pub fn $required(self) -> Self {
                self.param(ParamKind::$kind, None)
            }

            #[must_use]
            pub fn $optional(self, default: impl Into<Value>) -> Self {
                self.param(ParamKind::$kind, Some(default.into()))
            }
        )*
    };
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(mut self, kind: ParamKind, default: Option<Value>) -> Self {
        self.params.push(Param { kind, default });
        self
    }

    param_methods! {
        any, optional_any => Any;
        number, optional_number => Number;
        integer, optional_integer => Integer;
        string, optional_string => String;
        boolean, optional_boolean => Boolean;
        table, optional_table => Table;
        function, optional_function => Function;
    }

    /// A proxy of host type `U`.
    #[must_use]
    pub fn host<U: Any>(self) -> Self {
        let kind = ParamKind::Host {
            type_id: TypeId::of::<U>(),
            name: short_type_name::<U>(),
        };
        self.param(kind, None)
    }

    #[must_use]
    pub fn arguments(self) -> Self {
        self.param(ParamKind::Arguments, None)
    }

    #[must_use]
    pub fn cancellation(self) -> Self {
        self.param(ParamKind::Cancellation, None)
    }

    #[must_use]
    pub fn engine(self) -> Self {
        self.param(ParamKind::Engine, None)
    }

    /// Parameters that consume script arguments.
    pub fn script_arity(&self) -> usize {
        self.params.iter().filter(|p| !p.kind.is_injected()).count()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ParamKind> {
        self.params.iter().map(|p| &p.kind)
    }
}

/// One bound parameter.
#[derive(Clone, Debug)]
pub enum Bound {
    Value(Value),
    Arguments(Values),
    Cancellation(Cancellation),
    Engine(Engine),
}

/// Arguments bound for one host call, indexed by declared parameter position.
#[derive(Debug)]
pub struct HostCall {
    name: Arc<str>,
    bound: Vec<Bound>,
    engine: Engine,
    context: CallContext,
}

impl HostCall {
    /// Exposed name of the method being called.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bound(&self) -> &[Bound] {
        &self.bound
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub fn value(&self, index: usize) -> Value {
        match self.bound.get(index) {
            Some(Bound::Value(v)) => v.clone(),
            _ => Value::Nil,
        }
    }

    pub fn number(&self, index: usize) -> f64 {
        self.value(index).as_number()
    }

    /// Number parameter truncated toward zero.
    pub fn integer(&self, index: usize) -> i64 {
        self.number(index) as i64
    }

    pub fn string(&self, index: usize) -> Arc<str> {
        self.value(index)
            .coerce_string()
            .unwrap_or_else(|| Arc::from(""))
    }

    pub fn boolean(&self, index: usize) -> bool {
        self.value(index).as_bool()
    }

    pub fn table(&self, index: usize) -> Option<Table> {
        self.value(index).as_table().cloned()
    }

    pub fn function(&self, index: usize) -> Option<Function> {
        self.value(index).as_function().cloned()
    }

    /// The host object behind a `Host` parameter.
    pub fn host<U: Any + Send + Sync>(&self, index: usize) -> Option<Arc<U>> {
        host_instance::<U>(&self.value(index))
    }

    pub fn arguments(&self, index: usize) -> Values {
        match self.bound.get(index) {
            Some(Bound::Arguments(values)) => values.clone(),
            _ => Values::new(),
        }
    }
}

/// Downcast the instance behind a proxy value.
pub(crate) fn host_instance<U: Any + Send + Sync>(value: &Value) -> Option<Arc<U>> {
    let binding = value.as_table()?.proxy_binding()?;
    let instance = binding.instance.clone()?;
    instance.downcast::<U>().ok()
}

/// `my_crate::module::User` becomes `User`.
pub(crate) fn short_type_name<U: ?Sized>() -> &'static str {
    let full = std::any::type_name::<U>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Bind `args` against `signature`.
///
/// For instance methods the first argument must be the receiver proxy; it
/// is returned separately and counts as argument #1 in error messages.
pub(crate) fn bind<T: Any + Send + Sync>(
    name: &Arc<str>,
    signature: &Signature,
    instance: bool,
    args: Values,
    engine: &Engine,
    cx: &CallContext,
) -> EvalResult<(Option<Arc<T>>, HostCall)> {
    let mut cursor = 0;
    let receiver = if instance {
        let first = args.first();
        let receiver = first.and_then(host_instance::<T>);
        if receiver.is_none() {
            let got = first.map_or("no value", Value::type_name);
            return Err(bad_self_argument(name, short_type_name::<T>(), got));
        }
        cursor = 1;
        receiver
    } else {
        None
    };
    let script_args: Values = args[cursor..].iter().cloned().collect();

    let mut bound = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        let slot = match &param.kind {
            ParamKind::Arguments => Bound::Arguments(script_args.clone()),
            ParamKind::Cancellation => Bound::Cancellation(cx.cancellation().clone()),
            ParamKind::Engine => Bound::Engine(engine.clone()),
            kind => {
                let position = cursor + 1;
                let arg = args.get(cursor);
                cursor += 1;
                let value = match (arg, &param.default) {
                    (None | Some(Value::Nil), Some(default)) => default.clone(),
                    (None, None) => {
                        return Err(argument_count(signature.script_arity(), script_args.len()));
                    }
                    (Some(arg), _) => convert(kind, arg, position, name)?,
                };
                Bound::Value(value)
            }
        };
        bound.push(slot);
    }

    Ok((
        receiver,
        HostCall {
            name: name.clone(),
            bound,
            engine: engine.clone(),
            context: cx.clone(),
        },
    ))
}

fn convert(kind: &ParamKind, arg: &Value, position: usize, name: &str) -> EvalResult<Value> {
    let mismatch = || bad_argument_type(position, name, kind.expected(), Some(arg));
    match kind {
        ParamKind::Any | ParamKind::Boolean => Ok(arg.clone()),
        ParamKind::Number | ParamKind::Integer => {
            arg.to_number().map(Value::Number).ok_or_else(mismatch)
        }
        ParamKind::String => arg.coerce_string().map(Value::String).ok_or_else(mismatch),
        ParamKind::Table => match arg {
            Value::Table(_) => Ok(arg.clone()),
            _ => Err(mismatch()),
        },
        ParamKind::Function => match arg {
            Value::Function(_) => Ok(arg.clone()),
            Value::Table(t) if protocol::is_callable(t) => {
                Ok(Value::Function(Function::proxy_adapter(t.clone())))
            }
            _ => Err(mismatch()),
        },
        ParamKind::Host { type_id, .. } => {
            let matches = arg
                .as_table()
                .and_then(Table::proxy_binding)
                .and_then(|b| b.instance.as_ref())
                .is_some_and(|instance| (**instance).type_id() == *type_id);
            if matches {
                Ok(arg.clone())
            } else {
                Err(mismatch())
            }
        }
        ParamKind::Arguments | ParamKind::Cancellation | ParamKind::Engine => Ok(Value::Nil),
    }
}

#[cfg(test)]
mod tests;
