//! Tables: thread-safe ordered hash storage plus metatable, scope parent,
//! and optional host-object binding.
//!
//! Storage keeps entries in insertion order in a slot vector indexed by an
//! `FxHashMap`. Assigning nil to an existing key leaves a nil slot behind
//! so `next` stays stable while a traversal clears fields; nil slots are
//! compacted away on a later insertion of a new key once they outnumber
//! live entries.
//!
//! Concurrent writers to the same key race with last-write-wins semantics.
//! Callers that share tables between executions coordinate themselves.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{next_id, Value};
use crate::errors::{invalid_key, metatable_error, ErrorKind, EvalResult, RuntimeError};
use crate::proxy::ClassDescriptor;

/// Handle to a table. Cloning shares the table.
#[derive(Clone)]
pub struct Table(pub(crate) Arc<TableInner>);

pub(crate) struct TableInner {
    id: u64,
    storage: RwLock<Storage>,
    metatable: RwLock<Option<Table>>,
    /// Enclosing scope, only set on scope tables.
    parent: RwLock<Option<Table>>,
    is_scope: bool,
    proxy: Option<ProxyBinding>,
}

/// Host object (or, for a class table, the host type) behind a proxy table.
#[derive(Clone)]
pub struct ProxyBinding {
    /// `None` for a class table, which exposes static members.
    pub(crate) instance: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) class: Arc<ClassDescriptor>,
}

impl ProxyBinding {
    pub fn instance(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.instance.as_ref()
    }

    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }
}

#[derive(Default)]
struct Storage {
    slots: Vec<Slot>,
    index: FxHashMap<TableKey, usize>,
    live: usize,
}

struct Slot {
    key: Value,
    value: Value,
}

/// Hashable key form. Numbers hash by bits with `-0.0` folded into `0.0`.
#[derive(Clone, PartialEq, Eq, Hash)]
enum TableKey {
    Bool(bool),
    Number(u64),
    String(Arc<str>),
    Ref(u64),
}

impl TableKey {
    /// Key for `value`, or the reason it cannot be a key.
    fn new(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Nil => Err("nil"),
            Value::Boolean(b) => Ok(TableKey::Bool(*b)),
            Value::Number(n) if n.is_nan() => Err("NaN"),
            Value::Number(n) => Ok(TableKey::Number(if *n == 0.0 { 0f64 } else { *n }.to_bits())),
            Value::String(s) => Ok(TableKey::String(s.clone())),
            Value::Table(t) => Ok(TableKey::Ref(t.id())),
            Value::Function(f) => Ok(TableKey::Ref(f.id())),
            Value::UserData(u) => Ok(TableKey::Ref(u.id())),
        }
    }
}

impl Storage {
    fn slot_of(&self, key: &Value) -> Option<usize> {
        let key = TableKey::new(key).ok()?;
        self.index.get(&key).copied()
    }

    fn get(&self, key: &Value) -> Value {
        self.slot_of(key)
            .map(|i| self.slots[i].value.clone())
            .unwrap_or_default()
    }

    /// Set `key`; `keep_nil` inserts a slot even for a nil value.
    fn set(&mut self, key: Value, value: Value, keep_nil: bool, compact: bool) -> EvalResult<()> {
        let table_key = TableKey::new(&key).map_err(invalid_key)?;
        if let Some(&i) = self.index.get(&table_key) {
            let slot = &mut self.slots[i];
            match (slot.value.is_nil(), value.is_nil()) {
                (true, false) => self.live += 1,
                (false, true) => self.live -= 1,
                _ => {}
            }
            slot.value = value;
            return Ok(());
        }
        if value.is_nil() && !keep_nil {
            return Ok(());
        }
        if compact && self.slots.len() > 8 && self.slots.len() - self.live > self.live {
            self.compact();
        }
        if !value.is_nil() {
            self.live += 1;
        }
        self.index.insert(table_key, self.slots.len());
        self.slots.push(Slot { key, value });
        Ok(())
    }

    fn compact(&mut self) {
        self.slots.retain(|slot| !slot.value.is_nil());
        self.index.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Ok(key) = TableKey::new(&slot.key) {
                self.index.insert(key, i);
            }
        }
    }

    fn first_live_from(&self, start: usize) -> Option<(Value, Value)> {
        self.slots[start.min(self.slots.len())..]
            .iter()
            .find(|slot| !slot.value.is_nil())
            .map(|slot| (slot.key.clone(), slot.value.clone()))
    }
}

impl Table {
    pub fn new() -> Self {
        Self::build(false, None, None)
    }

    /// A scope table whose lookups fall back to `parent`.
    pub fn scope(parent: Option<Table>) -> Self {
        Self::build(true, parent, None)
    }

    pub(crate) fn proxy(binding: ProxyBinding, metatable: Option<Table>) -> Self {
        let table = Self::build(false, None, Some(binding));
        *table.0.metatable.write() = metatable;
        table
    }

    fn build(is_scope: bool, parent: Option<Table>, proxy: Option<ProxyBinding>) -> Self {
        Table(Arc::new(TableInner {
            id: next_id(),
            storage: RwLock::new(Storage::default()),
            metatable: RwLock::new(None),
            parent: RwLock::new(parent),
            is_scope,
            proxy,
        }))
    }

    /// Sequence table `{v1, v2, ...}`.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let table = Table::new();
        {
            let mut storage = table.0.storage.write();
            for (i, value) in values.into_iter().enumerate() {
                // integer keys are never invalid
                let _ = storage.set(Value::Number((i + 1) as f64), value, false, false);
            }
        }
        table
    }

    /// Stable identity token.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    pub fn is_scope(&self) -> bool {
        self.0.is_scope
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // Raw storage

    /// Storage lookup without metatables or proxy properties.
    pub fn raw_get(&self, key: &Value) -> Value {
        self.0.storage.read().get(key)
    }

    /// Storage update without metatables or proxy properties.
    ///
    /// Fails for nil and NaN keys.
    pub fn raw_set(&self, key: impl Into<Value>, value: impl Into<Value>) -> EvalResult<()> {
        let compact = !self.0.is_scope;
        self.0
            .storage
            .write()
            .set(key.into(), value.into(), false, compact)
    }

    /// `raw_set` for a string key, which is always a valid key.
    pub fn set_field(&self, name: &str, value: impl Into<Value>) {
        let _ = self.raw_set(name, value);
    }

    /// Whether `key` holds a non-nil value in storage.
    pub fn contains_key(&self, key: &Value) -> bool {
        !self.raw_get(key).is_nil()
    }

    /// Bind a local name in a scope table, even to nil, so it shadows
    /// outer bindings.
    pub(crate) fn declare(&self, name: Value, value: Value) -> EvalResult<()> {
        self.0.storage.write().set(name, value, true, false)
    }

    /// Whether this scope binds `key`, including locals bound to nil.
    pub(crate) fn binds(&self, key: &Value) -> bool {
        self.0.storage.read().slot_of(key).is_some()
    }

    /// Number of non-nil entries in storage.
    pub fn len(&self) -> usize {
        self.0.storage.read().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-nil entries in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0
            .storage
            .read()
            .slots
            .iter()
            .filter(|slot| !slot.value.is_nil())
            .map(|slot| (slot.key.clone(), slot.value.clone()))
            .collect()
    }

    /// Entry following `key` in iteration order; nil starts the traversal.
    ///
    /// Returns `Ok(None)` past the last entry and an error for a key that
    /// is not in the table.
    pub fn next(&self, key: &Value) -> EvalResult<Option<(Value, Value)>> {
        let storage = self.0.storage.read();
        if key.is_nil() {
            return Ok(storage.first_live_from(0));
        }
        match storage.slot_of(key) {
            Some(i) => Ok(storage.first_live_from(i + 1)),
            None => Err(RuntimeError::new(
                ErrorKind::BadArgumentType,
                "invalid key to 'next'",
            )),
        }
    }

    /// Append at `len + 1`.
    pub fn push(&self, value: impl Into<Value>) -> EvalResult<()> {
        let next = self.len() + 1;
        self.raw_set(Value::Number(next as f64), value)
    }

    // Proxy-aware access

    pub fn proxy_binding(&self) -> Option<&ProxyBinding> {
        self.0.proxy.as_ref()
    }

    /// Whether `key` names a host property exposed by this proxy.
    pub fn is_property(&self, key: &Value) -> bool {
        match (&self.0.proxy, key) {
            (Some(binding), Value::String(name)) => binding
                .class
                .property(name, binding.instance.is_some())
                .is_some(),
            _ => false,
        }
    }

    /// Lookup that reads host properties on proxies, storage otherwise.
    pub fn get(&self, key: &Value) -> EvalResult<Value> {
        if let (Some(binding), Value::String(name)) = (&self.0.proxy, key) {
            if let Some(property) = binding.class.property(name, binding.instance.is_some()) {
                return property.read(name, binding.instance.as_deref());
            }
        }
        Ok(self.raw_get(key))
    }

    /// Update that writes host properties on proxies, storage otherwise.
    pub fn set(&self, key: Value, value: Value) -> EvalResult<()> {
        if let (Some(binding), Value::String(name)) = (&self.0.proxy, &key) {
            if let Some(property) = binding.class.property(name, binding.instance.is_some()) {
                return property.write(name, binding.instance.as_deref(), value);
            }
        }
        self.raw_set(key, value)
    }

    /// Enumerable keys: non-nil storage keys, plus readable host
    /// properties whose current value is non-nil.
    pub fn keys(&self) -> Vec<Value> {
        let mut keys: Vec<Value> = self.entries().into_iter().map(|(k, _)| k).collect();
        if let Some(binding) = &self.0.proxy {
            let instance = binding.instance.as_deref();
            for (name, property) in binding.class.properties(instance.is_some()) {
                if !property.is_readable() {
                    continue;
                }
                let key = Value::String(name.clone());
                if keys.contains(&key) {
                    continue;
                }
                if property.read(name, instance).is_ok_and(|v| !v.is_nil()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    // Metatable and scope parent

    pub fn metatable(&self) -> Option<Table> {
        self.0.metatable.read().clone()
    }

    /// Replace the metatable. Proxies keep their per-type metatable.
    pub fn set_metatable(&self, metatable: Option<Table>) -> EvalResult<()> {
        if self.0.proxy.is_some() {
            return Err(metatable_error("cannot change the metatable of a host object"));
        }
        *self.0.metatable.write() = metatable;
        Ok(())
    }

    pub fn parent(&self) -> Option<Table> {
        self.0.parent.read().clone()
    }

    /// Drop every outgoing reference. Used by the cycle collector.
    pub(crate) fn clear(&self) {
        let old = std::mem::take(&mut *self.0.storage.write());
        let metatable = self.0.metatable.write().take();
        let parent = self.0.parent.write().take();
        drop((old, metatable, parent));
    }

    /// Every value this table references: keys, values, metatable, parent.
    pub(crate) fn references(&self) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::new();
        for slot in &self.0.storage.read().slots {
            out.push(slot.key.clone());
            out.push(slot.value.clone());
        }
        if let Some(mt) = self.metatable() {
            out.push(Value::Table(mt));
        }
        if let Some(parent) = self.parent() {
            out.push(Value::Table(parent));
        }
        out
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<TableInner> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn from_inner(inner: Arc<TableInner>) -> Self {
        Table(inner)
    }

    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table: 0x{:08x}", self.id())
    }
}
