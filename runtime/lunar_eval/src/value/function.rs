//! Function values.
//!
//! Every variant shares one contract: [`Function::call`] returns a boxed
//! future yielding the result list. Call boundaries are where the
//! evaluator recurses, so each call is polled with stack growth.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use lunar_ir::FunctionDef;

use super::{next_id, Table, Value, Values};
use crate::context::CallContext;
use crate::engine::Engine;
use crate::errors::EvalResult;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Synchronous host callback.
pub type NativeFn =
    Arc<dyn Fn(&Engine, Values, &CallContext) -> EvalResult<Values> + Send + Sync>;

/// Host callback that may suspend.
pub type AsyncNativeFn = Arc<
    dyn Fn(Engine, Values, CallContext) -> BoxFuture<'static, EvalResult<Values>> + Send + Sync,
>;

/// Script function: a body plus the scope it was defined in.
#[derive(Clone)]
pub struct Closure {
    pub(crate) def: Arc<FunctionDef>,
    pub(crate) scope: Table,
    /// When false the body runs directly in `scope` instead of a child of
    /// it. Only the top-level chunk is built this way.
    pub(crate) extends_scope: bool,
}

impl Closure {
    pub fn def(&self) -> &Arc<FunctionDef> {
        &self.def
    }

    pub fn scope(&self) -> &Table {
        &self.scope
    }
}

pub enum FunctionKind {
    Interpreted(Closure),
    NativeSync(NativeFn),
    NativeAsync(AsyncNativeFn),
    /// Delegates to a callable proxy table.
    Proxy(Table),
}

/// Handle to a function. Cloning shares the function.
#[derive(Clone)]
pub struct Function(Arc<FunctionInner>);

pub(crate) struct FunctionInner {
    id: u64,
    name: Arc<str>,
    kind: FunctionKind,
}

impl Function {
    fn from_kind(name: impl Into<Arc<str>>, kind: FunctionKind) -> Self {
        Function(Arc::new(FunctionInner {
            id: next_id(),
            name: name.into(),
            kind,
        }))
    }

    /// Synchronous host function over its arguments.
    pub fn native<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Values) -> EvalResult<Values> + Send + Sync + 'static,
    {
        Self::from_kind(
            name,
            FunctionKind::NativeSync(Arc::new(move |_, args, _| f(args))),
        )
    }

    /// Synchronous host function that also receives the engine and call context.
    pub fn native_with_engine<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Engine, Values, &CallContext) -> EvalResult<Values> + Send + Sync + 'static,
    {
        Self::from_kind(name, FunctionKind::NativeSync(Arc::new(f)))
    }

    /// Asynchronous host function. Calling it is a suspension point.
    pub fn native_async<F, Fut>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Engine, Values, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EvalResult<Values>> + Send + 'static,
    {
        let f: AsyncNativeFn = Arc::new(move |engine, args, cx| Box::pin(f(engine, args, cx)));
        Self::from_kind(name, FunctionKind::NativeAsync(f))
    }

    pub(crate) fn interpreted(closure: Closure) -> Self {
        let name = closure
            .def
            .name
            .clone()
            .unwrap_or_else(|| Arc::from("anonymous"));
        Self::from_kind(name, FunctionKind::Interpreted(closure))
    }

    pub(crate) fn proxy_adapter(table: Table) -> Self {
        Self::from_kind("proxy", FunctionKind::Proxy(table))
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.0.kind
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Invoke with `args`. The call runs one level deeper than `cx`.
    pub fn call(
        &self,
        engine: &Engine,
        args: Values,
        cx: &CallContext,
    ) -> BoxFuture<'static, EvalResult<Values>> {
        let this = self.clone();
        let engine = engine.clone();
        let cx = cx.clone();
        Box::pin(lunar_stack::grow_on_poll(Box::pin(async move {
            this.invoke(engine, args, cx).await
        })))
    }

    async fn invoke(self, engine: Engine, args: Values, cx: CallContext) -> EvalResult<Values> {
        let cx = cx.nested()?;
        tracing::trace!(function = %self.name(), depth = cx.depth(), "call");
        match &self.0.kind {
            FunctionKind::Interpreted(closure) => {
                crate::interpreter::call_closure(&engine, closure, args, &cx).await
            }
            FunctionKind::NativeSync(f) => f(&engine, args, &cx),
            FunctionKind::NativeAsync(f) => f(engine.clone(), args, cx.clone()).await,
            FunctionKind::Proxy(table) => {
                crate::protocol::call(&engine, &Value::Table(table.clone()), args, &cx).await
            }
        }
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<FunctionInner> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn from_inner(inner: Arc<FunctionInner>) -> Self {
        Function(inner)
    }

    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// The captured scope of an interpreted function.
    pub(crate) fn captured_scope(&self) -> Option<&Table> {
        match &self.0.kind {
            FunctionKind::Interpreted(closure) => Some(&closure.scope),
            FunctionKind::Proxy(table) => Some(table),
            _ => None,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function: 0x{:08x} ({})", self.id(), self.name())
    }
}
