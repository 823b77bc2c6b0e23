//! Cycle collector for tables and interpreted functions.
//!
//! Values are reference counted, so cycles (a scope holding a closure that
//! captured the scope, tables pointing at each other) never drop on their
//! own. The engine keeps weak handles to everything it allocates and
//! periodically runs trial deletion over them:
//!
//! 1. For each tracked object, count the references held by other tracked
//!    objects.
//! 2. An object whose strong count exceeds that is referenced from outside
//!    the tracked graph (globals, the host, a running frame): a root.
//! 3. Mark everything reachable from a root. Unmarked tables are cleared,
//!    which releases the cycles they are part of.

use std::sync::Weak;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::value::{Function, FunctionInner, Table, TableInner, Value};

/// Result of one collection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Live tracked objects before the collection.
    pub tracked: usize,
    /// Objects found unreachable.
    pub collected: usize,
}

struct Registry<T> {
    entries: Vec<Weak<T>>,
    prune_at: usize,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: Vec::new(),
            prune_at: 64,
        }
    }
}

impl<T> Registry<T> {
    fn push(&mut self, entry: Weak<T>) {
        if self.entries.len() >= self.prune_at {
            self.entries.retain(|w| w.strong_count() > 0);
            self.prune_at = (self.entries.len() * 2).max(64);
        }
        self.entries.push(entry);
    }
}

#[derive(Default)]
pub(crate) struct Heap {
    tables: Mutex<Registry<TableInner>>,
    functions: Mutex<Registry<FunctionInner>>,
}

enum Node {
    Table(Table),
    Function(Function),
}

impl Node {
    fn strong_count(&self) -> usize {
        match self {
            Node::Table(t) => t.strong_count(),
            Node::Function(f) => f.strong_count(),
        }
    }

    fn references(&self) -> Vec<Value> {
        match self {
            Node::Table(t) => t.references(),
            Node::Function(f) => f
                .captured_scope()
                .map(|scope| vec![Value::Table(scope.clone())])
                .unwrap_or_default(),
        }
    }
}

fn ref_id(value: &Value) -> Option<u64> {
    match value {
        Value::Table(t) => Some(t.id()),
        Value::Function(f) => Some(f.id()),
        _ => None,
    }
}

impl Heap {
    pub(crate) fn track_table(&self, table: &Table) {
        self.tables.lock().push(table.downgrade());
    }

    pub(crate) fn track_function(&self, function: &Function) {
        self.functions.lock().push(function.downgrade());
    }

    /// Registered entries, including ones not yet pruned.
    pub(crate) fn tracked(&self) -> usize {
        self.tables.lock().entries.len() + self.functions.lock().entries.len()
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn collect(&self) -> CollectStats {
        let nodes = self.live_nodes();
        let index: FxHashMap<u64, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let id = match node {
                    Node::Table(t) => t.id(),
                    Node::Function(f) => f.id(),
                };
                (id, i)
            })
            .collect();

        // Snapshot before `references` clones any handles. Each count
        // includes the handle held in `nodes`.
        let strong: Vec<usize> = nodes.iter().map(Node::strong_count).collect();
        let mut internal = vec![0usize; nodes.len()];
        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let targets: Vec<usize> = node
                .references()
                .iter()
                .filter_map(|v| ref_id(v).and_then(|id| index.get(&id).copied()))
                .collect();
            for &target in &targets {
                internal[target] += 1;
            }
            edges.push(targets);
        }

        let mut marked = vec![false; nodes.len()];
        let mut stack: Vec<usize> = (0..nodes.len())
            .filter(|&i| strong[i].saturating_sub(1) > internal[i])
            .collect();
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut marked[i], true) {
                continue;
            }
            stack.extend(edges[i].iter().copied().filter(|&j| !marked[j]));
        }

        let mut collected = 0;
        for (node, marked) in nodes.iter().zip(&marked) {
            if *marked {
                continue;
            }
            collected += 1;
            if let Node::Table(t) = node {
                t.clear();
            }
        }

        let stats = CollectStats {
            tracked: nodes.len(),
            collected,
        };
        tracing::debug!(tracked = stats.tracked, collected = stats.collected, "collected");
        stats
    }

    /// Upgrade every live entry, dropping dead ones from the registries.
    fn live_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        {
            let mut tables = self.tables.lock();
            tables.entries.retain(|w| w.strong_count() > 0);
            nodes.extend(
                tables
                    .entries
                    .iter()
                    .filter_map(Weak::upgrade)
                    .map(|inner| Node::Table(Table::from_inner(inner))),
            );
        }
        {
            let mut functions = self.functions.lock();
            functions.entries.retain(|w| w.strong_count() > 0);
            nodes.extend(
                functions
                    .entries
                    .iter()
                    .filter_map(Weak::upgrade)
                    .map(|inner| Node::Function(Function::from_inner(inner))),
            );
        }
        nodes
    }
}
