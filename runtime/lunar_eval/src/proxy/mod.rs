//! Host object bridge.
//!
//! A host type implements [`ProxyClass`] to declare its script surface
//! through a [`ClassBuilder`]. The resulting [`ClassDescriptor`] is built
//! once per type and cached process-wide. Each engine then derives two
//! tables per type: the class table (methods plus static properties) and
//! the instance metatable (`__index` = class table, `__call` when the type
//! is callable). Instances are proxy tables whose property keys redirect
//! to the host object.

mod binding;
mod builder;
mod convert;
mod member;

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

pub use binding::{Bound, HostCall, ParamKind, Signature};
pub use builder::ClassBuilder;
pub use convert::{from_host_object, IntoValues};
pub use member::{Member, PropertyAccess, PropertyDef};

use crate::value::{Function, Table};

/// A host type with a script-visible surface.
pub trait ProxyClass: Any + Send + Sync + Sized {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self>;
}

/// Script surface of one host type.
pub struct ClassDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    methods: Vec<(Arc<str>, Function)>,
    instance_properties: Vec<(Arc<str>, PropertyDef)>,
    static_properties: Vec<(Arc<str>, PropertyDef)>,
    call: Option<Function>,
}

impl ClassDescriptor {
    pub(crate) fn empty(type_id: TypeId, type_name: &'static str) -> Self {
        ClassDescriptor {
            type_id,
            type_name,
            methods: Vec::new(),
            instance_properties: Vec::new(),
            static_properties: Vec::new(),
            call: None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Exposed methods, instance and static, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = (&Arc<str>, &Function)> {
        self.methods.iter().map(|(name, f)| (name, f))
    }

    pub fn method(&self, name: &str) -> Option<&Function> {
        self.methods
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, f)| f)
    }

    /// Instance or static property by exposed name.
    pub fn property(&self, name: &str, instance: bool) -> Option<&PropertyDef> {
        self.property_list(instance)
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, p)| p)
    }

    pub fn properties(&self, instance: bool) -> impl Iterator<Item = (&Arc<str>, &PropertyDef)> {
        self.property_list(instance).iter().map(|(name, p)| (name, p))
    }

    pub fn is_callable(&self) -> bool {
        self.call.is_some()
    }

    fn property_list(&self, instance: bool) -> &[(Arc<str>, PropertyDef)] {
        if instance {
            &self.instance_properties
        } else {
            &self.static_properties
        }
    }

    /// Later registrations under the same name replace earlier ones.
    pub(crate) fn insert_method(&mut self, name: Arc<str>, function: Function) {
        self.methods.retain(|(n, _)| *n != name);
        self.methods.push((name, function));
    }

    pub(crate) fn insert_property(&mut self, name: Arc<str>, def: PropertyDef, instance: bool) {
        let list = if instance {
            &mut self.instance_properties
        } else {
            &mut self.static_properties
        };
        list.retain(|(n, _)| *n != name);
        list.push((name, def));
    }
}

fn descriptors() -> &'static DashMap<TypeId, Arc<ClassDescriptor>> {
    static DESCRIPTORS: OnceLock<DashMap<TypeId, Arc<ClassDescriptor>>> = OnceLock::new();
    DESCRIPTORS.get_or_init(DashMap::new)
}

/// The cached descriptor for `T`, built on first use.
///
/// `describe` runs with no map lock held, so it may look up other
/// descriptors. Racing first uses each build one; the first insert wins.
pub fn descriptor<T: ProxyClass>() -> Arc<ClassDescriptor> {
    let type_id = TypeId::of::<T>();
    if let Some(cached) = cached_descriptor(type_id) {
        return cached;
    }
    let class = T::describe(ClassBuilder::new()).build();
    tracing::debug!(
        class = class.type_name,
        methods = class.methods.len(),
        properties = class.instance_properties.len() + class.static_properties.len(),
        "built class descriptor"
    );
    descriptors()
        .entry(type_id)
        .or_insert_with(|| Arc::new(class))
        .clone()
}

pub(crate) fn cached_descriptor(type_id: TypeId) -> Option<Arc<ClassDescriptor>> {
    descriptors().get(&type_id).map(|entry| entry.clone())
}

/// Per-engine tables derived from class descriptors.
#[derive(Default)]
pub(crate) struct ClassTables {
    classes: DashMap<TypeId, Table>,
    metatables: DashMap<TypeId, Table>,
}

impl ClassTables {
    /// Class table: a proxy with no instance, so static properties stay
    /// live, holding every exposed method.
    pub(crate) fn class_table(&self, class: &Arc<ClassDescriptor>) -> Table {
        self.classes
            .entry(class.type_id)
            .or_insert_with(|| {
                let binding = crate::value::ProxyBinding {
                    instance: None,
                    class: class.clone(),
                };
                let table = Table::proxy(binding, None);
                for (name, function) in &class.methods {
                    table.set_field(name, function.clone());
                }
                table
            })
            .clone()
    }

    pub(crate) fn instance_metatable(&self, class: &Arc<ClassDescriptor>) -> Table {
        if let Some(mt) = self.metatables.get(&class.type_id) {
            return mt.clone();
        }
        let class_table = self.class_table(class);
        self.metatables
            .entry(class.type_id)
            .or_insert_with(|| {
                let mt = Table::new();
                mt.set_field("__index", class_table);
                if let Some(call) = &class.call {
                    mt.set_field("__call", call.clone());
                }
                mt
            })
            .clone()
    }

    pub(crate) fn instance(
        &self,
        instance: Arc<dyn Any + Send + Sync>,
        class: Arc<ClassDescriptor>,
    ) -> Table {
        let metatable = self.instance_metatable(&class);
        let binding = crate::value::ProxyBinding {
            instance: Some(instance),
            class,
        };
        Table::proxy(binding, Some(metatable))
    }
}

#[cfg(test)]
mod tests;
