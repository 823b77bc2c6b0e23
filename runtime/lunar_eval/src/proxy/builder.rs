//! Statically declared class surfaces.

use std::any::{Any, TypeId};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use super::binding::{bind, short_type_name, HostCall, Signature};
use super::convert::IntoValues;
use super::member::{Getter, Member, PropertyAccess, PropertyDef, Setter};
use super::ClassDescriptor;
use crate::errors::{EvalResult, ErrorKind, RuntimeError};
use crate::value::{Function, Value};

/// Builder for the script-visible surface of host type `T`.
///
/// Visibility and property access are resolved as members are added, so
/// set the class defaults before registering members.
pub struct ClassBuilder<T> {
    methods_visible: bool,
    property_access: PropertyAccess,
    descriptor: ClassDescriptor,
    _marker: PhantomData<fn(T)>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub(crate) fn new() -> Self {
        ClassBuilder {
            methods_visible: true,
            property_access: PropertyAccess::default(),
            descriptor: ClassDescriptor::empty(TypeId::of::<T>(), short_type_name::<T>()),
            _marker: PhantomData,
        }
    }

    /// Whether unmarked methods are exposed. Defaults to `true`.
    #[must_use]
    pub fn default_method_visibility(mut self, visible: bool) -> Self {
        self.methods_visible = visible;
        self
    }

    /// Access granted to unmarked properties. Defaults to read and write.
    #[must_use]
    pub fn default_property_access(mut self, access: PropertyAccess) -> Self {
        self.property_access = access;
        self
    }

    /// Instance method, called as `obj:name(...)`.
    #[must_use]
    pub fn method<R, F>(self, member: impl Into<Member>, signature: Signature, f: F) -> Self
    where
        R: IntoValues,
        F: Fn(Arc<T>, HostCall) -> EvalResult<R> + Send + Sync + 'static,
    {
        self.add_method(member.into(), |name| {
            Function::native_with_engine(name.clone(), move |engine, args, cx| {
                let (receiver, call) = bind::<T>(&name, &signature, true, args, engine, cx)?;
                let receiver = receiver.ok_or_else(|| missing_receiver(&name))?;
                f(receiver, call).map(IntoValues::into_values)
            })
        })
    }

    /// Method without a receiver, called as `Class.name(...)`.
    #[must_use]
    pub fn static_method<R, F>(self, member: impl Into<Member>, signature: Signature, f: F) -> Self
    where
        R: IntoValues,
        F: Fn(HostCall) -> EvalResult<R> + Send + Sync + 'static,
    {
        self.add_method(member.into(), |name| {
            Function::native_with_engine(name.clone(), move |engine, args, cx| {
                let (_, call) = bind::<T>(&name, &signature, false, args, engine, cx)?;
                f(call).map(IntoValues::into_values)
            })
        })
    }

    /// Instance method whose host operation suspends.
    #[must_use]
    pub fn async_method<R, F, Fut>(
        self,
        member: impl Into<Member>,
        signature: Signature,
        f: F,
    ) -> Self
    where
        R: IntoValues,
        F: Fn(Arc<T>, HostCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EvalResult<R>> + Send + 'static,
    {
        let f = Arc::new(f);
        self.add_method(member.into(), |name| {
            Function::native_async(name.clone(), move |engine, args, cx| {
                let bound = bind::<T>(&name, &signature, true, args, &engine, &cx);
                let f = f.clone();
                let name = name.clone();
                async move {
                    let (receiver, call) = bound?;
                    let receiver = receiver.ok_or_else(|| missing_receiver(&name))?;
                    f(receiver, call).await.map(IntoValues::into_values)
                }
            })
        })
    }

    /// Static method whose host operation suspends.
    #[must_use]
    pub fn async_static_method<R, F, Fut>(
        self,
        member: impl Into<Member>,
        signature: Signature,
        f: F,
    ) -> Self
    where
        R: IntoValues,
        F: Fn(HostCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EvalResult<R>> + Send + 'static,
    {
        let f = Arc::new(f);
        self.add_method(member.into(), |name| {
            Function::native_async(name.clone(), move |engine, args, cx| {
                let bound = bind::<T>(&name, &signature, false, args, &engine, &cx);
                let f = f.clone();
                async move {
                    let (_, call) = bound?;
                    f(call).await.map(IntoValues::into_values)
                }
            })
        })
    }

    /// Make instances callable: `obj(...)` invokes `f` with `obj` as receiver.
    #[must_use]
    pub fn callable<R, F>(mut self, signature: Signature, f: F) -> Self
    where
        R: IntoValues,
        F: Fn(Arc<T>, HostCall) -> EvalResult<R> + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(self.descriptor.type_name);
        let function = Function::native_with_engine(name.clone(), move |engine, args, cx| {
            let (receiver, call) = bind::<T>(&name, &signature, true, args, engine, cx)?;
            let receiver = receiver.ok_or_else(|| missing_receiver(&name))?;
            f(receiver, call).map(IntoValues::into_values)
        });
        self.descriptor.call = Some(function);
        self
    }

    /// Read-only instance property.
    #[must_use]
    pub fn property<V, G>(self, member: impl Into<Member>, get: G) -> Self
    where
        V: Into<Value>,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.add_property(member.into(), true, Some(instance_getter(get)), None)
    }

    /// Instance property with a setter. Host objects are shared, so the
    /// setter mutates through interior mutability.
    #[must_use]
    pub fn property_rw<V, G, S>(self, member: impl Into<Member>, get: G, set: S) -> Self
    where
        V: Into<Value>,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&T, Value) -> EvalResult<()> + Send + Sync + 'static,
    {
        let setter: Setter = Arc::new(move |host, value| set(downcast_host::<T>(host)?, value));
        self.add_property(member.into(), true, Some(instance_getter(get)), Some(setter))
    }

    /// Read-only property on the class table.
    #[must_use]
    pub fn static_property<V, G>(self, member: impl Into<Member>, get: G) -> Self
    where
        V: Into<Value>,
        G: Fn() -> V + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |_| Ok(get().into()));
        self.add_property(member.into(), false, Some(getter), None)
    }

    #[must_use]
    pub fn static_property_rw<V, G, S>(self, member: impl Into<Member>, get: G, set: S) -> Self
    where
        V: Into<Value>,
        G: Fn() -> V + Send + Sync + 'static,
        S: Fn(Value) -> EvalResult<()> + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |_| Ok(get().into()));
        let setter: Setter = Arc::new(move |_, value| set(value));
        self.add_property(member.into(), false, Some(getter), Some(setter))
    }

    fn add_method(mut self, member: Member, make: impl FnOnce(Arc<str>) -> Function) -> Self {
        if member.is_visible(self.methods_visible) {
            let name: Arc<str> = Arc::from(member.exposed_name());
            let function = make(name.clone());
            self.descriptor.insert_method(name, function);
        }
        self
    }

    fn add_property(
        mut self,
        member: Member,
        instance: bool,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        // Unmarked properties are visible whenever the class grants any access.
        let mut access = member.resolved_access(self.property_access);
        if getter.is_none() {
            access.remove(PropertyAccess::READABLE);
        }
        if setter.is_none() {
            access.remove(PropertyAccess::WRITABLE);
        }
        if access.is_empty() || !member.is_visible(true) {
            return self;
        }
        let name: Arc<str> = Arc::from(member.exposed_name());
        let def = PropertyDef {
            access,
            getter,
            setter,
        };
        self.descriptor.insert_property(name, def, instance);
        self
    }

    pub(crate) fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

fn instance_getter<T, V, G>(get: G) -> Getter
where
    T: Any + Send + Sync,
    V: Into<Value>,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |host| Ok(get(downcast_host::<T>(host)?).into()))
}

fn downcast_host<T: Any>(host: Option<&(dyn Any + Send + Sync)>) -> EvalResult<&T> {
    host.and_then(|h| h.downcast_ref::<T>()).ok_or_else(|| {
        RuntimeError::new(
            ErrorKind::NotIndexable,
            format!("instance property of '{}' read without an instance", short_type_name::<T>()),
        )
    })
}

#[cold]
fn missing_receiver(name: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::BadSelfArgument,
        format!("calling '{name}' without a receiver"),
    )
}
