//! Override tables: the plain description a configuration layer is built
//! from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ExtendResult;
use crate::runtime::Run;
use crate::value::{Kind, Value};

/// Dispatch key for an entry in a layer's handler table.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Method {
    /// The primary per-property dispatch (classify, then select a handler).
    ExtendProp,
    /// Combination of a similar-kind pair.
    Kind(Kind),
    /// Combination of a mismatched-kind pair.
    Different,
    /// Universal fallback combination.
    Default,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtendProp => f.write_str("extend_prop"),
            Self::Kind(kind) => write!(f, "{kind}"),
            Self::Different => f.write_str("different"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Arguments to a combination handler: the current and incoming values for
/// one property, with the containers they came from.
#[derive(Clone)]
pub struct Pair<'a> {
    /// Current value read from the target.
    pub first: Value,
    /// Incoming value read from the (resolved) source.
    pub second: Value,
    /// Property name being merged.
    pub name: &'a str,
    /// The object being merged into.
    pub target: &'a Value,
    /// The object being merged from.
    pub source: &'a Value,
}

impl<'a> Pair<'a> {
    /// Copy of this pair with the incoming value replaced.
    #[must_use]
    pub fn with_second(&self, second: Value) -> Self {
        Self {
            second,
            ..self.clone()
        }
    }
}

/// Combination handler: produces the new value for a property, or `None` to
/// leave the target unchanged.
pub type HandlerFn =
    Arc<dyn Fn(&mut Run, Pair<'_>) -> ExtendResult<Option<Value>> + Send + Sync>;

/// Property-enumeration function: `(source, target) -> names`.
pub type PropsFn =
    Arc<dyn Fn(&mut Run, &Value, &Value) -> ExtendResult<Vec<String>> + Send + Sync>;

/// Accessor for the current value: `(target, name, source) -> value`.
pub type FirstFn =
    Arc<dyn Fn(&mut Run, &Value, &str, &Value) -> ExtendResult<Value> + Send + Sync>;

/// Accessor for the incoming value: `(source, name, target) -> value`.
///
/// The target is mutable so depth probes and similar overrides can annotate
/// it while reading.
pub type SecondFn =
    Arc<dyn Fn(&mut Run, &Value, &str, &mut Value) -> ExtendResult<Value> + Send + Sync>;

/// Return-target hook applied when an engine invocation finishes.
pub type FinishFn = Arc<dyn Fn(&mut Run, Value) -> ExtendResult<Value> + Send + Sync>;

/// A plain description of configuration overrides.
///
/// Only explicitly set entries override anything; unset entries fall back
/// through the layer lineage. Built fluently:
///
/// ```
/// use deep_extend::{Kind, Overrides, Value};
///
/// let overrides = Overrides::new()
///     .deep(true)
///     .kind_handler(Kind::Array, |_run, pair| {
///         let mut items = pair.first.as_array().unwrap_or_default().to_vec();
///         items.extend(pair.second.as_array().unwrap_or_default().to_vec());
///         Ok(Some(Value::Array(items)))
///     });
/// assert!(overrides.has_handler_overrides());
/// ```
#[derive(Clone, Default)]
pub struct Overrides {
    pub(crate) deep: Option<bool>,
    pub(crate) extend_self: Option<bool>,
    pub(crate) resolve: Option<bool>,
    pub(crate) max_recursions: Option<usize>,
    pub(crate) level_offset: Option<i64>,
    pub(crate) descriptors_deep: Option<bool>,
    pub(crate) handlers: BTreeMap<Method, HandlerFn>,
    pub(crate) get_props: Option<PropsFn>,
    pub(crate) get_first: Option<FirstFn>,
    pub(crate) get_second: Option<SecondFn>,
    pub(crate) finish: Option<FinishFn>,
}

impl Overrides {
    /// Empty override table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nested object/array values merge recursively.
    #[must_use]
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = Some(deep);
        self
    }

    /// Whether merging an object into itself is permitted.
    #[must_use]
    pub fn extend_self(mut self, extend_self: bool) -> Self {
        self.extend_self = Some(extend_self);
        self
    }

    /// Whether decorators resolve eagerly (`true`) or propagate as metadata
    /// (`false`).
    #[must_use]
    pub fn resolve(mut self, resolve: bool) -> Self {
        self.resolve = Some(resolve);
        self
    }

    /// Recursion-depth ceiling for nested merges.
    #[must_use]
    pub fn max_recursions(mut self, max_recursions: usize) -> Self {
        self.max_recursions = Some(max_recursions);
        self
    }

    /// Offset applied to the level reported to handlers.
    #[must_use]
    pub fn level_offset(mut self, level_offset: i64) -> Self {
        self.level_offset = Some(level_offset);
        self
    }

    /// Whether the descriptors variant combines descriptor attributes
    /// instead of replacing them.
    #[must_use]
    pub fn descriptors_deep(mut self, descriptors_deep: bool) -> Self {
        self.descriptors_deep = Some(descriptors_deep);
        self
    }

    /// Registers a handler under an explicit dispatch key.
    #[must_use]
    pub fn handler(
        mut self,
        method: Method,
        f: impl Fn(&mut Run, Pair<'_>) -> ExtendResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(method, Arc::new(f));
        self
    }

    /// Registers the similar-kind handler for `kind`.
    #[must_use]
    pub fn kind_handler(
        self,
        kind: Kind,
        f: impl Fn(&mut Run, Pair<'_>) -> ExtendResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.handler(Method::Kind(kind), f)
    }

    /// Registers the mismatched-kind handler.
    #[must_use]
    pub fn different_handler(
        self,
        f: impl Fn(&mut Run, Pair<'_>) -> ExtendResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.handler(Method::Different, f)
    }

    /// Registers the universal fallback handler.
    #[must_use]
    pub fn default_handler(
        self,
        f: impl Fn(&mut Run, Pair<'_>) -> ExtendResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.handler(Method::Default, f)
    }

    /// Overrides the primary per-property dispatch.
    #[must_use]
    pub fn extend_prop(
        self,
        f: impl Fn(&mut Run, Pair<'_>) -> ExtendResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.handler(Method::ExtendProp, f)
    }

    /// Overrides property enumeration.
    #[must_use]
    pub fn get_props(
        mut self,
        f: impl Fn(&mut Run, &Value, &Value) -> ExtendResult<Vec<String>> + Send + Sync + 'static,
    ) -> Self {
        self.get_props = Some(Arc::new(f));
        self
    }

    /// Overrides the current-value accessor.
    #[must_use]
    pub fn get_first(
        mut self,
        f: impl Fn(&mut Run, &Value, &str, &Value) -> ExtendResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.get_first = Some(Arc::new(f));
        self
    }

    /// Overrides the incoming-value accessor.
    #[must_use]
    pub fn get_second(
        mut self,
        f: impl Fn(&mut Run, &Value, &str, &mut Value) -> ExtendResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.get_second = Some(Arc::new(f));
        self
    }

    /// Overrides the return-target hook.
    #[must_use]
    pub fn finish(
        mut self,
        f: impl Fn(&mut Run, Value) -> ExtendResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.finish = Some(Arc::new(f));
        self
    }

    /// Whether any combination handler is overridden.
    #[must_use]
    pub fn has_handler_overrides(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Whether nothing at all is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deep.is_none()
            && self.extend_self.is_none()
            && self.resolve.is_none()
            && self.max_recursions.is_none()
            && self.level_offset.is_none()
            && self.descriptors_deep.is_none()
            && self.handlers.is_empty()
            && self.get_props.is_none()
            && self.get_first.is_none()
            && self.get_second.is_none()
            && self.finish.is_none()
    }

    /// Names of the overridden entries, for diagnostics.
    #[must_use]
    pub fn overridden_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        if self.get_props.is_some() {
            names.push("get_props".to_owned());
        }
        if self.get_first.is_some() {
            names.push("get_first".to_owned());
        }
        if self.get_second.is_some() {
            names.push("get_second".to_owned());
        }
        if self.finish.is_some() {
            names.push("finish".to_owned());
        }
        names
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("deep", &self.deep)
            .field("extend_self", &self.extend_self)
            .field("resolve", &self.resolve)
            .field("max_recursions", &self.max_recursions)
            .field("level_offset", &self.level_offset)
            .field("descriptors_deep", &self.descriptors_deep)
            .field("methods", &self.overridden_methods())
            .finish()
    }
}

impl From<bool> for Overrides {
    /// Boolean shorthand: `true` is `{deep: true}`, `false` overrides
    /// nothing.
    fn from(deep: bool) -> Self {
        if deep { Self::new().deep(true) } else { Self::new() }
    }
}
