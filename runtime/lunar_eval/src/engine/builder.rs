//! `EngineBuilder` for configuring an [`Engine`].

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::{Engine, EngineInner};
use crate::heap::Heap;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::proxy::ClassTables;
use crate::stdlib;
use crate::value::Table;

/// Builder for [`Engine`].
pub struct EngineBuilder {
    max_call_depth: usize,
    gc_threshold: Option<usize>,
    print_handler: Option<SharedPrintHandler>,
    standard_libraries: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        EngineBuilder {
            max_call_depth: 200,
            gc_threshold: None,
            print_handler: None,
            standard_libraries: true,
        }
    }

    /// Nesting limit for calls. Exceeding it raises a stack overflow error.
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Collect cycles automatically once this many objects are tracked.
    /// `None` leaves collection to `Engine::collect_garbage`.
    #[must_use]
    pub fn gc_threshold(mut self, threshold: Option<usize>) -> Self {
        self.gc_threshold = threshold;
        self
    }

    /// Destination of `print`. Defaults to stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Install base, string, math and bit32. Defaults to `true`.
    #[must_use]
    pub fn standard_libraries(mut self, install: bool) -> Self {
        self.standard_libraries = install;
        self
    }

    pub fn build(self) -> Engine {
        let engine = Engine(Arc::new(EngineInner {
            globals: Table::new(),
            string_metatable: Table::new(),
            max_call_depth: self.max_call_depth,
            gc_threshold: self.gc_threshold,
            print: self.print_handler.unwrap_or_else(stdout_handler),
            classes: ClassTables::default(),
            heap: Heap::default(),
            in_flight: AtomicUsize::new(0),
        }));
        if self.standard_libraries {
            stdlib::install(&engine);
        }
        engine
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
