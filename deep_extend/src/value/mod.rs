//! Dynamic value model for the merge engine.
//!
//! [`Value`] carries every kind the classifier distinguishes, including
//! callables, deferred (future) values, and foreign values that expose a
//! plain-value coercion. Property trees are built from [`Object`] containers
//! and plain arrays; both merge through the same engine.

mod convert;
mod func;
mod kind;
mod object;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::ExtendResult;
use crate::runtime::Run;

pub use func::{Func, FuncArgs};
pub use kind::Kind;
pub use object::{Accessor, Descriptor, Object, PropData};

/// Plain-value coercion protocol.
///
/// Foreign values implementing this trait are unwrapped before
/// classification and merging, mirroring a host-language "get underlying
/// value" capability. The engine calls it but does not define what the
/// underlying value is.
pub trait PlainValue: Send + Sync {
    /// The underlying plain value.
    fn plain_value(&self) -> Value;
}

/// A value that is still being produced.
///
/// Wraps a shared future so a single deferred value can be awaited from
/// several places; failures are shared the same way through
/// [`ExtendResult`]'s `Arc`'d error.
#[derive(Clone)]
pub struct Deferred {
    inner: Shared<BoxFuture<'static, ExtendResult<Value>>>,
}

impl Deferred {
    /// Wraps a future as a deferred value.
    pub fn new(fut: impl Future<Output = ExtendResult<Value>> + Send + 'static) -> Self {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    /// Awaits the deferred value.
    ///
    /// # Errors
    ///
    /// Propagates the failure the underlying future settled with.
    pub async fn resolve(&self) -> ExtendResult<Value> {
        self.inner.clone().await
    }

    /// Whether two handles share one underlying future.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// A dynamic value flowing through the merge engine.
#[derive(Clone)]
pub enum Value {
    /// Absent value.
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number, using the JSON number model.
    Number(serde_json::Number),
    /// Text.
    String(String),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Property-bearing container.
    Object(Object),
    /// Callable value.
    Func(Func),
    /// Value still being produced; only the deferred engine awaits it.
    Deferred(Deferred),
    /// Foreign value exposing the plain-value coercion.
    External(Arc<dyn PlainValue>),
}

impl Value {
    /// Classifies this value; see [`Kind::of`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        Kind::of(self)
    }

    /// Wraps a future as a [`Value::Deferred`].
    pub fn deferred(fut: impl Future<Output = ExtendResult<Value>> + Send + 'static) -> Self {
        Self::Deferred(Deferred::new(fut))
    }

    /// Whether this is [`Value::Undefined`].
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Truthiness, matching loose host-language semantics: `undefined`,
    /// `null`, `false`, zero, NaN, and the empty string are falsy.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null | Self::Bool(false) => true,
            Self::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Resolves the plain-value coercion, repeatedly if needed.
    #[must_use]
    pub fn into_unwrapped(self) -> Self {
        let mut value = self;
        while let Self::External(ext) = value {
            value = ext.plain_value();
        }
        value
    }

    /// Borrows this value as an object, if it is one.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Mutably borrows this value as an object, if it is one.
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrows this value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows this value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Fresh empty container of the same shape: `[]` for arrays, `{}`
    /// otherwise.
    #[must_use]
    pub fn empty_like(template: &Self) -> Self {
        match template {
            Self::Array(_) => Self::Array(Vec::new()),
            _ => Self::Object(Object::new()),
        }
    }

    /// Plain value of an own property, for objects and arrays.
    ///
    /// Array properties are addressed by decimal index names.
    #[must_use]
    pub fn get_prop(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Object(obj) => obj.get(name),
            Self::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Reads a property, invoking accessor getters on objects.
    ///
    /// Absent properties and non-containers read as [`Value::Undefined`].
    ///
    /// # Errors
    ///
    /// Propagates a failure raised by an accessor getter.
    pub fn get_prop_resolved(&self, run: &mut Run, name: &str) -> ExtendResult<Self> {
        match self {
            Self::Object(obj) => obj.get_resolved(run, name),
            other => Ok(other.get_prop(name).cloned().unwrap_or(Self::Undefined)),
        }
    }

    /// Directly assigns a property on a container, as user code would.
    ///
    /// Objects go through [`Object::insert`] (clearing decorator records
    /// for the name); arrays accept index names. Writes to anything else
    /// are discarded with a diagnostic.
    pub fn set_prop(&mut self, name: &str, value: impl Into<Self>) {
        match self {
            Self::Object(obj) => obj.insert(name, value),
            other => other.write_merged(name, value.into()),
        }
    }

    /// Engine-internal property write for containers.
    ///
    /// Writing past the end of an array pads with [`Value::Undefined`];
    /// a non-index name on an array is discarded with a diagnostic, and a
    /// write to a non-container is ignored.
    pub(crate) fn write_merged(&mut self, name: &str, value: Self) {
        match self {
            Self::Object(obj) => obj.write_merged(name, value),
            Self::Array(items) => match name.parse::<usize>() {
                Ok(index) => {
                    if index >= items.len() {
                        items.resize(index + 1, Self::Undefined);
                    }
                    if let Some(slot) = items.get_mut(index) {
                        *slot = value;
                    }
                }
                Err(_) => {
                    tracing::debug!(name, "discarding non-index property write on array");
                }
            },
            _ => {
                tracing::debug!(name, "discarding property write on non-container");
            }
        }
    }

    /// Enumerable own property names: object keys, or array indices.
    #[must_use]
    pub fn prop_names(&self) -> Vec<String> {
        match self {
            Self::Object(obj) => obj.prop_names(),
            Self::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// All own property names, including non-enumerable object slots.
    #[must_use]
    pub fn all_prop_names(&self) -> Vec<String> {
        match self {
            Self::Object(obj) => obj.all_prop_names(),
            other => other.prop_names(),
        }
    }

    /// Descriptor of an own property, synthesising plain descriptors for
    /// array elements.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<Descriptor> {
        match self {
            Self::Object(obj) => obj.descriptor(name),
            Self::Array(_) => self.get_prop(name).cloned().map(Descriptor::value),
            _ => None,
        }
    }

    /// Installs a descriptor on a container.
    ///
    /// Arrays only accept plain data descriptors at index names; anything
    /// else is discarded with a diagnostic.
    pub fn define_prop(&mut self, name: &str, descriptor: Descriptor) {
        match self {
            Self::Object(obj) => obj.define(name, descriptor),
            other => match descriptor.data {
                PropData::Value(value) => other.write_merged(name, value),
                PropData::Accessor(_) => {
                    tracing::debug!(name, "discarding accessor descriptor on non-object");
                }
            },
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Undefined
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Object(obj) => f.debug_tuple("Object").field(obj).finish(),
            Self::Func(func) => fmt::Debug::fmt(func, f),
            Self::Deferred(deferred) => fmt::Debug::fmt(deferred, f),
            Self::External(_) => f.write_str("External(..)"),
        }
    }
}

/// Structural equality, with identity semantics for the opaque payloads:
/// callables and deferred values compare by handle, external values by
/// allocation.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => a == b,
            (Self::Deferred(a), Self::Deferred(b)) => a == b,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
