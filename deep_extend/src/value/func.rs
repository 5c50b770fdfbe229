//! Callable property values.

use std::fmt;
use std::sync::Arc;

use crate::error::ExtendResult;
use crate::runtime::Run;

use super::Value;

/// Arguments handed to a [`Func`] when the engine invokes it.
///
/// Getter decorators and accessor slots call property functions with the
/// merge target, the (resolved) source, and the property name in question.
#[derive(Clone, Copy)]
pub struct FuncArgs<'a> {
    /// The object being merged into.
    pub target: &'a Value,
    /// The object the function was read from.
    pub source: &'a Value,
    /// Property name under which the function was found.
    pub name: &'a str,
}

type FuncInner = dyn Fn(&mut Run, FuncArgs<'_>) -> ExtendResult<Value> + Send + Sync;

/// A callable value.
///
/// Functions participate in merging like any other kind (the default policy
/// replaces them wholesale), but some parts of the engine also invoke them:
/// the `getter` decorator calls a property's function to produce its merged
/// value, and accessor slots call their getter when a property is read.
///
/// Equality is callable identity, not behaviour.
#[derive(Clone)]
pub struct Func {
    name: Arc<str>,
    inner: Arc<FuncInner>,
}

impl Func {
    /// Wraps a closure as a callable value labelled `name`.
    ///
    /// The label appears in debug output and in [`crate::ExtendError::Handler`]
    /// diagnostics raised from the closure.
    pub fn new(
        name: impl Into<Arc<str>>,
        f: impl Fn(&mut Run, FuncArgs<'_>) -> ExtendResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(f),
        }
    }

    /// Label given at construction time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callable.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the wrapped closure reports.
    pub fn call(&self, run: &mut Run, args: FuncArgs<'_>) -> ExtendResult<Value> {
        (self.inner)(run, args)
    }

    /// Whether two handles wrap the same callable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func({})", self.name)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
