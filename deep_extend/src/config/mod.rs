//! Layered merge configuration.
//!
//! A configuration is a chain of layers (`Default < Base < Static <
//! Primary`), each holding only the entries it overrides. Resolution checks
//! a layer's own table and then its parent, so every configuration,
//! however derived, resolves to exactly one handler per kind: the root
//! [`Tier::Default`] layer defines them all. Deriving layers a new leaf
//! without mutating ancestors, which keeps configurations cheap to re-derive
//! and safe to share.

mod defaults;
mod overrides;
mod tier;

use std::sync::Arc;

use crate::error::{ExtendError, ExtendResult};
use crate::runtime::Run;
use crate::value::Value;

pub use defaults::{DEFAULT_MAX_RECURSIONS, enumerate};
pub use overrides::{
    FinishFn, FirstFn, HandlerFn, Method, Overrides, Pair, PropsFn, SecondFn,
};
pub use tier::Tier;

/// One layer in a configuration lineage.
pub(crate) struct Layer {
    pub(crate) tier: Tier,
    pub(crate) table: Overrides,
    pub(crate) parent: Option<Arc<Layer>>,
}

impl Layer {
    /// Resolves a handler starting at `start` and walking to the root.
    ///
    /// Returns the handler together with the layer that defines it, which is
    /// what `call_next` needs to continue the walk from the right spot.
    pub(crate) fn find_handler(
        start: &Arc<Self>,
        method: Method,
    ) -> Option<(Arc<Self>, HandlerFn)> {
        let mut layer = start.clone();
        loop {
            if let Some(f) = layer.table.handlers.get(&method) {
                return Some((layer.clone(), f.clone()));
            }
            let parent = layer.parent.clone()?;
            layer = parent;
        }
    }

    fn flag<T: Copy>(start: &Arc<Self>, pick: impl Fn(&Overrides) -> Option<T>) -> Option<T> {
        let mut layer = start.clone();
        loop {
            if let Some(v) = pick(&layer.table) {
                return Some(v);
            }
            let parent = layer.parent.clone()?;
            layer = parent;
        }
    }

    fn field<T: Clone>(
        start: &Arc<Self>,
        pick: impl Fn(&Overrides) -> Option<&T>,
    ) -> Option<T> {
        let mut layer = start.clone();
        loop {
            if let Some(v) = pick(&layer.table) {
                return Some(v.clone());
            }
            let parent = layer.parent.clone()?;
            layer = parent;
        }
    }
}

/// Handle to an immutable configuration lineage.
///
/// Cloning is cheap; derivation never mutates ancestors. A value of this
/// type in leading-argument position is recognised as configuration by the
/// argument-preparation entry points.
#[derive(Clone)]
pub struct ExtendConfig {
    pub(crate) head: Arc<Layer>,
}

impl ExtendConfig {
    /// The default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: defaults::default_layer(),
        }
    }

    /// Default configuration specialised by one override table.
    #[must_use]
    pub fn with(overrides: Overrides) -> Self {
        Self::new().derive(overrides)
    }

    /// Derives a configuration with a user ([`Tier::Static`]) layer on top.
    #[must_use]
    pub fn derive(&self, overrides: Overrides) -> Self {
        self.derive_tier(Tier::Static, overrides)
    }

    /// Derives with a [`Tier::Base`] layer (engine-variant baseline).
    #[must_use]
    pub fn derive_base(&self, overrides: Overrides) -> Self {
        self.derive_tier(Tier::Base, overrides)
    }

    /// Derives with a [`Tier::Primary`] layer (call-site specialisation).
    #[must_use]
    pub fn derive_primary(&self, overrides: Overrides) -> Self {
        self.derive_tier(Tier::Primary, overrides)
    }

    /// Chains several override tables in turn; later tables take precedence.
    #[must_use]
    pub fn derive_all(&self, overrides: impl IntoIterator<Item = Overrides>) -> Self {
        overrides
            .into_iter()
            .fold(self.clone(), |config, table| config.derive(table))
    }

    fn derive_tier(&self, tier: Tier, overrides: Overrides) -> Self {
        Self {
            head: Arc::new(Layer {
                tier,
                table: overrides,
                parent: Some(self.head.clone()),
            }),
        }
    }

    /// Tier of the most specific layer.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.head.tier
    }

    /// Whether nested containers merge recursively.
    #[must_use]
    pub fn deep(&self) -> bool {
        Layer::flag(&self.head, |t| t.deep).unwrap_or(false)
    }

    /// Whether self-merges are performed rather than skipped.
    #[must_use]
    pub fn extend_self(&self) -> bool {
        Layer::flag(&self.head, |t| t.extend_self).unwrap_or(false)
    }

    /// Whether decorators resolve eagerly.
    #[must_use]
    pub fn resolve(&self) -> bool {
        Layer::flag(&self.head, |t| t.resolve).unwrap_or(true)
    }

    /// Recursion ceiling for nested merges.
    #[must_use]
    pub fn max_recursions(&self) -> usize {
        Layer::flag(&self.head, |t| t.max_recursions)
            .unwrap_or(DEFAULT_MAX_RECURSIONS)
    }

    /// Offset applied to the level reported to handlers.
    #[must_use]
    pub fn level_offset(&self) -> i64 {
        Layer::flag(&self.head, |t| t.level_offset).unwrap_or(0)
    }

    /// Whether descriptor merging combines attributes instead of replacing.
    #[must_use]
    pub fn descriptors_deep(&self) -> bool {
        Layer::flag(&self.head, |t| t.descriptors_deep).unwrap_or(false)
    }

    /// Primary per-property dispatch.
    ///
    /// Classifies the pair and invokes the appropriate handler; `None`
    /// means "leave the target property unchanged".
    ///
    /// # Errors
    ///
    /// Fails when no lineage layer defines the required method, or when the
    /// invoked handler fails.
    pub fn combine(&self, run: &mut Run, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
        run.with_active_config(self, |run| run.dispatch(&[Method::ExtendProp], pair))
    }

    /// Enumerates the property names to merge from `source` into `target`.
    ///
    /// # Errors
    ///
    /// Propagates a failure from an enumeration override.
    pub fn get_props(
        &self,
        run: &mut Run,
        source: &Value,
        target: &Value,
    ) -> ExtendResult<Vec<String>> {
        let f = Layer::field(&self.head, |t| t.get_props.as_ref())
            .ok_or_else(|| ExtendError::missing_method("get_props"))?;
        run.with_active_config(self, |run| f(run, source, target))
    }

    /// Reads the current value for `name` from the target.
    ///
    /// # Errors
    ///
    /// Propagates a failure from an accessor override or getter.
    pub fn get_first(
        &self,
        run: &mut Run,
        target: &Value,
        name: &str,
        source: &Value,
    ) -> ExtendResult<Value> {
        let f = Layer::field(&self.head, |t| t.get_first.as_ref())
            .ok_or_else(|| ExtendError::missing_method("get_first"))?;
        run.with_active_config(self, |run| f(run, target, name, source))
    }

    /// Reads the incoming value for `name` from the (resolved) source.
    ///
    /// # Errors
    ///
    /// Propagates a failure from an accessor override or getter.
    pub fn get_second(
        &self,
        run: &mut Run,
        source: &Value,
        name: &str,
        target: &mut Value,
    ) -> ExtendResult<Value> {
        let f = Layer::field(&self.head, |t| t.get_second.as_ref())
            .ok_or_else(|| ExtendError::missing_method("get_second"))?;
        run.with_active_config(self, |run| f(run, source, name, target))
    }

    /// Applies the return-target hook to a finished merge result.
    ///
    /// # Errors
    ///
    /// Propagates a failure from a finish override.
    pub fn finish(&self, run: &mut Run, target: Value) -> ExtendResult<Value> {
        let f = Layer::field(&self.head, |t| t.finish.as_ref())
            .ok_or_else(|| ExtendError::missing_method("finish"))?;
        run.with_active_config(self, |run| f(run, target))
    }
}

impl Default for ExtendConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExtendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tiers = Vec::new();
        let mut layer = Some(self.head.clone());
        while let Some(l) = layer {
            tiers.push(l.tier);
            layer = l.parent.clone();
        }
        f.debug_struct("ExtendConfig").field("layers", &tiers).finish()
    }
}

/// Conversion of leading-argument shorthands into a configuration.
///
/// Implemented for configurations themselves, for the boolean deep-merge
/// shorthand, for bare override tables, and for `()` (no configuration).
pub trait IntoExtendConfig {
    /// Resolves the shorthand to a configuration.
    fn into_extend_config(self) -> ExtendConfig;
}

impl IntoExtendConfig for ExtendConfig {
    fn into_extend_config(self) -> ExtendConfig {
        self
    }
}

impl IntoExtendConfig for &ExtendConfig {
    fn into_extend_config(self) -> ExtendConfig {
        self.clone()
    }
}

impl IntoExtendConfig for bool {
    fn into_extend_config(self) -> ExtendConfig {
        if self {
            ExtendConfig::with(Overrides::new().deep(true))
        } else {
            ExtendConfig::new()
        }
    }
}

impl IntoExtendConfig for () {
    fn into_extend_config(self) -> ExtendConfig {
        ExtendConfig::new()
    }
}

impl IntoExtendConfig for Overrides {
    fn into_extend_config(self) -> ExtendConfig {
        ExtendConfig::with(self)
    }
}
