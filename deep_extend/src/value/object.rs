//! Property-bearing container and its descriptor model.

use std::collections::BTreeMap;

use crate::decorator::DecoratorSet;
use crate::error::ExtendResult;
use crate::runtime::Run;

use super::func::{Func, FuncArgs};
use super::Value;

/// Getter/setter pair backing an accessor property.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accessor {
    /// Called when the property is read.
    pub get: Option<Func>,
    /// Called when the property is assigned.
    pub set: Option<Func>,
}

/// Data carried by a property: a plain value or an accessor pair.
#[derive(Clone, Debug, PartialEq)]
pub enum PropData {
    /// Ordinary data property.
    Value(Value),
    /// Property computed through a getter/setter.
    Accessor(Accessor),
}

/// Full description of a property: its data plus attributes.
///
/// This is the unit the descriptors merge variant operates on, mirroring the
/// shape of host-language property descriptors (value or getter/setter, and
/// the enumerable/writable/configurable attributes).
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    /// Property data.
    pub data: PropData,
    /// Whether ordinary enumeration reports the property.
    pub enumerable: bool,
    /// Whether plain assignment may replace the value.
    pub writable: bool,
    /// Whether the descriptor itself may be redefined.
    pub configurable: bool,
}

impl Descriptor {
    /// Plain enumerable data descriptor around `value`.
    #[must_use]
    pub const fn value(value: Value) -> Self {
        Self {
            data: PropData::Value(value),
            enumerable: true,
            writable: true,
            configurable: true,
        }
    }

    /// Enumerable accessor descriptor.
    #[must_use]
    pub const fn accessor(get: Option<Func>, set: Option<Func>) -> Self {
        Self {
            data: PropData::Accessor(Accessor { get, set }),
            enumerable: true,
            writable: true,
            configurable: true,
        }
    }

    /// Descriptor representing an absent property.
    #[must_use]
    pub const fn undefined() -> Self {
        Self::value(Value::Undefined)
    }

    /// Whether this descriptor carries an accessor rather than plain data.
    #[must_use]
    pub const fn is_accessor(&self) -> bool {
        matches!(self.data, PropData::Accessor(_))
    }
}

/// Property-bearing container merged by the engine.
///
/// Properties live in an ordered map of [`Descriptor`] slots, so enumeration
/// is stable within a call. Decorator metadata is an explicit field rather
/// than a hidden property: it never shows up in enumeration and survives
/// engine-internal writes, but is cleared per property on direct
/// reassignment via [`Object::insert`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    slots: BTreeMap<String, Descriptor>,
    decorators: Option<DecoratorSet>,
}

impl Object {
    /// Empty object.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            decorators: None,
        }
    }

    /// Number of properties, enumerable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the object has no properties at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Plain value of an own property, if it is a data property.
    ///
    /// Accessor properties return `None` here; use [`Object::get_resolved`]
    /// to invoke getters.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.slots.get(name) {
            Some(Descriptor {
                data: PropData::Value(value),
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Reads a property, invoking its getter when it is an accessor.
    ///
    /// Absent properties read as [`Value::Undefined`].
    ///
    /// # Errors
    ///
    /// Propagates a failure raised by the property's getter.
    pub fn get_resolved(&self, run: &mut Run, name: &str) -> ExtendResult<Value> {
        match self.slots.get(name) {
            None => Ok(Value::Undefined),
            Some(Descriptor {
                data: PropData::Value(value),
                ..
            }) => Ok(value.clone()),
            Some(Descriptor {
                data: PropData::Accessor(accessor),
                ..
            }) => match &accessor.get {
                None => Ok(Value::Undefined),
                Some(getter) => {
                    let owner = Value::Object(self.clone());
                    getter.call(
                        run,
                        FuncArgs {
                            target: &owner,
                            source: &owner,
                            name,
                        },
                    )
                }
            },
        }
    }

    /// Directly assigns a property, as user code would.
    ///
    /// Reassignment clears any decorator records for that property, matching
    /// the rule that a decorated property loses its metadata once it is
    /// overwritten outside a merge.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if let Some(meta) = &mut self.decorators {
            meta.clear_prop(&name);
            if meta.is_empty() {
                self.decorators = None;
            }
        }
        self.slots.insert(name, Descriptor::value(value.into()));
    }

    /// Engine-internal write: stores a merged value without touching
    /// decorator records.
    pub(crate) fn write_merged(&mut self, name: &str, value: Value) {
        match self.slots.get_mut(name) {
            Some(slot) => slot.data = PropData::Value(value),
            None => {
                self.slots.insert(name.to_owned(), Descriptor::value(value));
            }
        }
    }

    /// Installs a full descriptor for `name`, replacing any existing slot.
    pub fn define(&mut self, name: impl Into<String>, descriptor: Descriptor) {
        self.slots.insert(name.into(), descriptor);
    }

    /// Descriptor of an own property.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<Descriptor> {
        self.slots.get(name).cloned()
    }

    /// Removes a property, returning its descriptor.
    pub fn remove(&mut self, name: &str) -> Option<Descriptor> {
        self.slots.remove(name)
    }

    /// Enumerable own property names, in stable map order.
    #[must_use]
    pub fn prop_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.enumerable)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All own property names, including non-enumerable ones.
    #[must_use]
    pub fn all_prop_names(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    /// Iterates plain data properties in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().filter_map(|(name, slot)| match &slot.data {
            PropData::Value(value) => Some((name.as_str(), value)),
            PropData::Accessor(_) => None,
        })
    }

    /// Decorator metadata attached to this object, if any.
    #[must_use]
    pub fn decorators(&self) -> Option<&DecoratorSet> {
        self.decorators.as_ref()
    }

    /// Decorator metadata, created on first use when `force_create` is set.
    pub fn decorators_mut(&mut self, force_create: bool) -> Option<&mut DecoratorSet> {
        if self.decorators.is_none() && force_create {
            self.decorators = Some(DecoratorSet::default());
        }
        self.decorators.as_mut()
    }

    /// Replaces the decorator metadata wholesale.
    pub fn set_decorators(&mut self, meta: Option<DecoratorSet>) {
        self.decorators = meta.filter(|m| !m.is_empty());
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut obj = Self::new();
        for (name, value) in iter {
            obj.insert(name, value);
        }
        obj
    }
}
