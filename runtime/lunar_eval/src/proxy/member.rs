//! Member markers and property access flags.

use std::sync::Arc;

use bitflags::bitflags;

use crate::errors::{EvalResult, ErrorKind, RuntimeError};
use crate::value::Value;

bitflags! {
    /// Script access to a host property.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct PropertyAccess: u8 {
        const READABLE = 1;
        const WRITABLE = 2;
    }
}

impl Default for PropertyAccess {
    fn default() -> Self {
        PropertyAccess::READABLE | PropertyAccess::WRITABLE
    }
}

/// Registration marker for one member.
///
/// A bare `&str` converts to an unmarked member: its script name is the
/// lower-cased member name and its visibility follows the class defaults.
/// Marking overrides the exposed name, visibility or property access.
#[derive(Clone, Debug)]
pub struct Member {
    name: String,
    exposed_as: Option<String>,
    visible: Option<bool>,
    access: Option<PropertyAccess>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Member {
            name: name.into(),
            exposed_as: None,
            visible: None,
            access: None,
        }
    }

    /// Expose under `name` verbatim.
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.exposed_as = Some(name.into());
        self
    }

    #[must_use]
    pub fn visible(mut self) -> Self {
        self.visible = Some(true);
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }

    #[must_use]
    pub fn access(mut self, access: PropertyAccess) -> Self {
        self.access = Some(access);
        self
    }

    /// Name scripts use for this member.
    pub fn exposed_name(&self) -> String {
        match &self.exposed_as {
            Some(name) => name.clone(),
            None => self.name.to_lowercase(),
        }
    }

    pub(crate) fn is_visible(&self, default: bool) -> bool {
        self.visible.unwrap_or(default)
    }

    pub(crate) fn resolved_access(&self, default: PropertyAccess) -> PropertyAccess {
        self.access.unwrap_or(default)
    }
}

impl From<&str> for Member {
    fn from(name: &str) -> Self {
        Member::new(name)
    }
}

impl From<String> for Member {
    fn from(name: String) -> Self {
        Member::new(name)
    }
}

type HostRef<'a> = Option<&'a (dyn std::any::Any + Send + Sync)>;

pub(crate) type Getter = Arc<dyn Fn(HostRef<'_>) -> EvalResult<Value> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(HostRef<'_>, Value) -> EvalResult<()> + Send + Sync>;

/// Accessors for one exposed property.
#[derive(Clone)]
pub struct PropertyDef {
    pub(crate) access: PropertyAccess,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl PropertyDef {
    pub fn access(&self) -> PropertyAccess {
        self.access
    }

    pub fn is_readable(&self) -> bool {
        self.access.contains(PropertyAccess::READABLE) && self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.access.contains(PropertyAccess::WRITABLE) && self.setter.is_some()
    }

    pub(crate) fn read(&self, name: &str, host: HostRef<'_>) -> EvalResult<Value> {
        match &self.getter {
            Some(getter) if self.is_readable() => getter(host),
            _ => Err(RuntimeError::new(
                ErrorKind::NotIndexable,
                format!("property '{name}' is not readable"),
            )),
        }
    }

    pub(crate) fn write(&self, name: &str, host: HostRef<'_>, value: Value) -> EvalResult<()> {
        match &self.setter {
            Some(setter) if self.is_writable() => setter(host, value),
            _ => Err(RuntimeError::new(
                ErrorKind::NotAssignable,
                format!("property '{name}' is not writable"),
            )),
        }
    }
}
