//! The embedding surface: globals, host registration and execution.

mod builder;

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lunar_ir::FunctionDef;

pub use builder::EngineBuilder;

use crate::context::{CallContext, Cancellation};
use crate::errors::{Error, EvalResult};
use crate::heap::{CollectStats, Heap};
use crate::print_handler::SharedPrintHandler;
use crate::proxy::{self, ClassDescriptor, ClassTables, ProxyClass};
use crate::value::{Closure, Function, Table, Value, Values};

/// Result list of a top-level execution.
pub type ExecOutcome = Values;

/// A script engine. Cloning shares the engine.
///
/// Independent executions may run concurrently on one engine and share its
/// globals. Table writes from concurrent executions race, last write wins;
/// hosts that need isolation coordinate it themselves.
#[derive(Clone)]
pub struct Engine(Arc<EngineInner>);

struct EngineInner {
    globals: Table,
    string_metatable: Table,
    max_call_depth: usize,
    gc_threshold: Option<usize>,
    print: SharedPrintHandler,
    classes: ClassTables,
    heap: Heap,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count when an execution ends.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Engine {
    /// Engine with the standard libraries and default configuration.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn globals(&self) -> &Table {
        &self.0.globals
    }

    pub fn set_global(&self, name: &str, value: impl Into<Value>) {
        self.0.globals.set_field(name, value);
    }

    pub fn get_global(&self, name: &str) -> Value {
        self.0.globals.raw_get(&Value::from(name))
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.0.print
    }

    /// Metatable shared by all strings.
    pub fn string_metatable(&self) -> &Table {
        &self.0.string_metatable
    }

    pub fn max_call_depth(&self) -> usize {
        self.0.max_call_depth
    }

    // Host registration

    pub fn register_function<F>(&self, name: &str, f: F) -> Function
    where
        F: Fn(Values) -> EvalResult<Values> + Send + Sync + 'static,
    {
        let function = Function::native(name, f);
        self.set_global(name, function.clone());
        tracing::debug!(name, "registered function");
        function
    }

    pub fn register_function_with_engine<F>(&self, name: &str, f: F) -> Function
    where
        F: Fn(&Engine, Values, &CallContext) -> EvalResult<Values> + Send + Sync + 'static,
    {
        let function = Function::native_with_engine(name, f);
        self.set_global(name, function.clone());
        tracing::debug!(name, "registered function");
        function
    }

    pub fn register_async_function<F, Fut>(&self, name: &str, f: F) -> Function
    where
        F: Fn(Engine, Values, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EvalResult<Values>> + Send + 'static,
    {
        let function = Function::native_async(name, f);
        self.set_global(name, function.clone());
        tracing::debug!(name, "registered async function");
        function
    }

    /// Expose `T`'s class table as global `name`. Registering again
    /// returns the same table.
    pub fn register_class<T: ProxyClass>(&self, name: &str) -> Table {
        let table = self.class_table::<T>();
        self.set_global(name, table.clone());
        tracing::debug!(name, class = std::any::type_name::<T>(), "registered class");
        table
    }

    /// Expose a host object as global `name`.
    pub fn register_instance<T: ProxyClass>(&self, name: &str, instance: Arc<T>) -> Table {
        let table = self.proxy(instance);
        self.set_global(name, table.clone());
        table
    }

    /// The class table of `T` in this engine.
    pub fn class_table<T: ProxyClass>(&self) -> Table {
        self.0.classes.class_table(&proxy::descriptor::<T>())
    }

    /// Wrap a host object in a proxy table.
    pub fn proxy<T: ProxyClass>(&self, instance: Arc<T>) -> Table {
        self.proxy_with(instance, proxy::descriptor::<T>())
    }

    pub(crate) fn proxy_with(
        &self,
        instance: Arc<dyn Any + Send + Sync>,
        class: Arc<ClassDescriptor>,
    ) -> Table {
        self.0.classes.instance(instance, class)
    }

    /// Convert a host object by its runtime type.
    pub fn to_value<T: Any + Send + Sync>(&self, object: Arc<T>) -> EvalResult<Value> {
        proxy::from_host_object(self, object)
    }

    // Allocation

    /// A new table tracked by the cycle collector.
    pub fn new_table(&self) -> Table {
        let table = Table::new();
        self.0.heap.track_table(&table);
        table
    }

    pub(crate) fn new_scope(&self, parent: Table) -> Table {
        let table = Table::scope(Some(parent));
        self.0.heap.track_table(&table);
        table
    }

    pub(crate) fn new_closure(&self, def: Arc<FunctionDef>, scope: Table) -> Function {
        let function = Function::interpreted(Closure {
            def,
            scope,
            extends_scope: true,
        });
        self.0.heap.track_function(&function);
        function
    }

    // Execution

    /// Parse `source` into the top-level chunk function. The chunk runs
    /// directly in the globals table, so its locals are globals.
    pub fn parse(&self, source: &str) -> Result<Function, Error> {
        let def = lunar_parse::parse(source)?;
        Ok(Function::interpreted(Closure {
            def: Arc::new(def),
            scope: self.0.globals.clone(),
            extends_scope: false,
        }))
    }

    pub async fn execute(&self, source: &str) -> Result<ExecOutcome, Error> {
        self.execute_with(source, Values::new(), Cancellation::new())
            .await
    }

    /// Parse and run `source` with `args` as its varargs.
    ///
    /// A cancelled execution returns `Ok` with no values.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub async fn execute_with(
        &self,
        source: &str,
        args: Values,
        cancellation: Cancellation,
    ) -> Result<ExecOutcome, Error> {
        let chunk = self.parse(source)?;
        self.call(&chunk, args, cancellation).await
    }

    /// Call `function` as a top-level execution.
    #[tracing::instrument(level = "debug", skip_all, fields(function = function.name()))]
    pub async fn call(
        &self,
        function: &Function,
        args: Values,
        cancellation: Cancellation,
    ) -> Result<ExecOutcome, Error> {
        let result = {
            let _guard = InFlight::enter(&self.0.in_flight);
            let cx = CallContext::new(cancellation, self.0.max_call_depth);
            function.call(self, args, &cx).await
        };
        self.maybe_collect();
        match result {
            Ok(values) => Ok(values),
            Err(err) if err.is_cancellation() => {
                tracing::debug!("execution stopped by cancellation");
                Ok(Values::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Run the cycle collector. Does nothing while an execution is running.
    pub fn collect_garbage(&self) -> CollectStats {
        if self.0.in_flight.load(Ordering::Acquire) > 0 {
            return CollectStats::default();
        }
        self.0.heap.collect()
    }

    fn maybe_collect(&self) {
        if let Some(threshold) = self.0.gc_threshold {
            if self.0.heap.tracked() > threshold {
                self.collect_garbage();
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("max_call_depth", &self.0.max_call_depth)
            .field("gc_threshold", &self.0.gc_threshold)
            .finish_non_exhaustive()
    }
}
