//! Per-property decorator metadata.
//!
//! A decorated object carries, per property name, an ordered list of
//! transformer functions and/or a property-specific configuration override.
//! During a merge the engine either resolves the decorators (executing the
//! transformers and specialising the configuration per property) or, when
//! `resolve` is off, propagates the records themselves onto the target so a
//! later merge can resolve them.
//!
//! Decoration happens through an explicit registration call rather than a
//! host-language annotation:
//!
//! ```
//! use deep_extend::decorator::{decorate, library};
//! use deep_extend::{Object, Value, extend};
//! use serde_json::json;
//!
//! let mut source = Object::new();
//! source.insert("tags", Value::from(json!(["a"])));
//! decorate(&mut source, "tags", library::concat())?;
//!
//! let target = extend(
//!     (),
//!     Value::from(json!({"tags": ["z"]})),
//!     [Value::Object(source)],
//! )?;
//! assert_eq!(target.get_prop("tags"), Some(&Value::from(json!(["z", "a"]))));
//! # Ok::<_, std::sync::Arc<deep_extend::ExtendError>>(())
//! ```

pub mod library;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{HandlerFn, Overrides};
use crate::error::{ExtendError, ExtendResult};
use crate::runtime::Run;
use crate::value::{Object, Value};

/// Reserved name under which host representations store decorator metadata.
///
/// The engine keeps metadata in a dedicated field, so this name never
/// appears in ordinary enumeration; [`filter_system_properties`] strips it
/// from the output of enumeration overrides that might surface it.
pub const METADATA_PROP: &str = "__decorators";

/// Transformer applied to a property value before merging.
///
/// Receives the value produced so far, the merge target, the full resolved
/// source object, and the property name.
pub type Transformer =
    Arc<dyn Fn(&mut Run, Value, &Value, &Object, &str) -> ExtendResult<Value> + Send + Sync>;

/// One decoration to register on a property.
pub enum Decoration {
    /// Transformer function applied at resolution time.
    Transform(Transformer),
    /// Property-specific configuration override.
    Config(Overrides),
    /// Several decorations applied in order.
    Many(Vec<Decoration>),
}

impl Decoration {
    /// Wraps a closure as a transformer decoration.
    pub fn transform(
        f: impl Fn(&mut Run, Value, &Value, &Object, &str) -> ExtendResult<Value>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::Transform(Arc::new(f))
    }

    /// Wraps an override table as a configuration decoration.
    #[must_use]
    pub const fn config(overrides: Overrides) -> Self {
        Self::Config(overrides)
    }
}

impl From<Overrides> for Decoration {
    fn from(overrides: Overrides) -> Self {
        Self::Config(overrides)
    }
}

impl From<Vec<Decoration>> for Decoration {
    fn from(list: Vec<Decoration>) -> Self {
        Self::Many(list)
    }
}

/// Decorator metadata attached to an object: ordered transformer lists and
/// mergeable configuration overrides, both keyed by property name.
#[derive(Clone, Default)]
pub struct DecoratorSet {
    pub(crate) transformers: BTreeMap<String, Vec<Transformer>>,
    pub(crate) configs: BTreeMap<String, Overrides>,
}

impl DecoratorSet {
    /// Whether no records are held at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty() && self.configs.is_empty()
    }

    /// Transformers recorded for a property, in registration order.
    #[must_use]
    pub fn transformers(&self, name: &str) -> Option<&[Transformer]> {
        self.transformers.get(name).map(Vec::as_slice)
    }

    /// Configuration override recorded for a property.
    #[must_use]
    pub fn config(&self, name: &str) -> Option<&Overrides> {
        self.configs.get(name)
    }

    /// Names carrying any record.
    #[must_use]
    pub fn decorated_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transformers.keys().cloned().collect();
        for name in self.configs.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Drops every record for a property (direct reassignment rule).
    pub fn clear_prop(&mut self, name: &str) {
        self.transformers.remove(name);
        self.configs.remove(name);
    }
}

impl fmt::Debug for DecoratorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transformer_counts: BTreeMap<&str, usize> = self
            .transformers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("DecoratorSet")
            .field("transformers", &transformer_counts)
            .field("configs", &self.configs)
            .finish()
    }
}

impl PartialEq for DecoratorSet {
    fn eq(&self, other: &Self) -> bool {
        transformer_maps_eq(&self.transformers, &other.transformers)
            && config_maps_eq(&self.configs, &other.configs)
    }
}

fn transformer_maps_eq(
    a: &BTreeMap<String, Vec<Transformer>>,
    b: &BTreeMap<String, Vec<Transformer>>,
) -> bool {
    a.len() == b.len()
        && a.iter().all(|(name, list)| {
            b.get(name).is_some_and(|other| {
                list.len() == other.len()
                    && list
                        .iter()
                        .zip(other.iter())
                        .all(|(x, y)| Arc::ptr_eq(x, y))
            })
        })
}

fn config_maps_eq(a: &BTreeMap<String, Overrides>, b: &BTreeMap<String, Overrides>) -> bool {
    a.len() == b.len() && a.keys().all(|name| b.contains_key(name))
}

/// Registers a decoration for `name` on `obj`.
///
/// Transformers append in registration order; configuration overrides merge
/// into any override already recorded for the property, composing
/// same-method handlers into a sequential pipeline.
///
/// # Errors
///
/// Returns [`ExtendError::ForbiddenDecoratorMethod`] immediately when a
/// configuration decoration overrides the options accessor or property
/// enumeration: invoking those through decorator resolution produces
/// undefined behaviour, so registration refuses them up front.
pub fn decorate(obj: &mut Object, name: &str, decoration: Decoration) -> ExtendResult<()> {
    match decoration {
        Decoration::Transform(t) => {
            record_transformer(obj, name, t);
            Ok(())
        }
        Decoration::Config(overrides) => record_config_override(obj, name, overrides),
        Decoration::Many(list) => {
            for d in list {
                decorate(obj, name, d)?;
            }
            Ok(())
        }
    }
}

/// Appends a transformer to a property's ordered list.
pub fn record_transformer(obj: &mut Object, name: &str, transformer: Transformer) {
    if let Some(meta) = obj.decorators_mut(true) {
        meta.transformers
            .entry(name.to_owned())
            .or_default()
            .push(transformer);
    }
}

/// Merges a configuration override into a property's recorded override.
///
/// # Errors
///
/// Rejects overrides of `get_second` or `get_props`; see [`decorate`].
pub fn record_config_override(
    obj: &mut Object,
    name: &str,
    overrides: Overrides,
) -> ExtendResult<()> {
    validate_override(&overrides)?;
    if let Some(meta) = obj.decorators_mut(true) {
        match meta.configs.get_mut(name) {
            Some(existing) => merge_override(existing, &overrides),
            None => {
                meta.configs.insert(name.to_owned(), overrides);
            }
        }
    }
    Ok(())
}

fn validate_override(overrides: &Overrides) -> ExtendResult<()> {
    if overrides.get_second.is_some() {
        return Err(Arc::new(ExtendError::ForbiddenDecoratorMethod {
            method: "get_second".to_owned(),
        }));
    }
    if overrides.get_props.is_some() {
        return Err(Arc::new(ExtendError::ForbiddenDecoratorMethod {
            method: "get_props".to_owned(),
        }));
    }
    Ok(())
}

/// Merges `incoming` into `into`: scalar entries later-win, while handlers
/// registered under the same method compose into a pipeline: the first
/// handler runs, and its result is fed as the incoming value to the second.
pub fn merge_override(into: &mut Overrides, incoming: &Overrides) {
    if incoming.deep.is_some() {
        into.deep = incoming.deep;
    }
    if incoming.extend_self.is_some() {
        into.extend_self = incoming.extend_self;
    }
    if incoming.resolve.is_some() {
        into.resolve = incoming.resolve;
    }
    if incoming.max_recursions.is_some() {
        into.max_recursions = incoming.max_recursions;
    }
    if incoming.level_offset.is_some() {
        into.level_offset = incoming.level_offset;
    }
    if incoming.descriptors_deep.is_some() {
        into.descriptors_deep = incoming.descriptors_deep;
    }
    for (method, second) in &incoming.handlers {
        match into.handlers.get(method) {
            Some(first) => {
                let composed = compose_handlers(first.clone(), second.clone());
                into.handlers.insert(*method, composed);
            }
            None => {
                into.handlers.insert(*method, second.clone());
            }
        }
    }
    if incoming.get_props.is_some() {
        into.get_props.clone_from(&incoming.get_props);
    }
    if incoming.get_first.is_some() {
        into.get_first.clone_from(&incoming.get_first);
    }
    if incoming.get_second.is_some() {
        into.get_second.clone_from(&incoming.get_second);
    }
    if incoming.finish.is_some() {
        into.finish.clone_from(&incoming.finish);
    }
}

fn compose_handlers(first: HandlerFn, second: HandlerFn) -> HandlerFn {
    Arc::new(move |run, pair| {
        let mid = first(run, pair.clone())?;
        second(run, pair.with_second(mid.unwrap_or(Value::Undefined)))
    })
}

/// Strips the reserved metadata name from an enumerated property-name list
/// so it is never treated as user data.
#[must_use]
pub fn filter_system_properties(mut names: Vec<String>) -> Vec<String> {
    names.retain(|name| name != METADATA_PROP);
    names
}

/// Resolves a source's decorators for one merge pass.
///
/// Returns the (possibly cloned) resolved source whose decorated property
/// values have been transformed, plus the per-property configuration
/// overrides to apply during the pass. When `resolve` is off or the source
/// carries no metadata, the source is returned untouched.
pub(crate) fn resolve_source(
    run: &mut Run,
    resolve: bool,
    target: &Value,
    source: &Value,
) -> ExtendResult<(Value, BTreeMap<String, Overrides>)> {
    if !resolve {
        return Ok((source.clone(), BTreeMap::new()));
    }
    let Some(obj) = source.as_object() else {
        return Ok((source.clone(), BTreeMap::new()));
    };
    let Some(meta) = obj.decorators() else {
        return Ok((source.clone(), BTreeMap::new()));
    };
    let prop_configs = meta.configs.clone();
    if meta.transformers.is_empty() {
        return Ok((source.clone(), prop_configs));
    }
    tracing::trace!(
        decorated = meta.transformers.len(),
        "resolving property decorators"
    );
    let mut resolved = obj.clone();
    for (name, funcs) in &meta.transformers {
        let mut current = resolved.get_resolved(run, name)?;
        for f in funcs {
            current = f(run, current, target, &resolved, name)?;
        }
        resolved.write_merged(name, current);
    }
    Ok((Value::Object(resolved), prop_configs))
}

/// Propagates decorator records from `source` onto `target` when a merge
/// runs with `resolve` off.
///
/// Target records for a property that the source overwrote with a plain,
/// undecorated value are dropped. Surviving same-property records merge
/// (transformer lists append, configuration overrides compose via
/// [`merge_override`]), so both objects' records are preserved.
pub(crate) fn merge_metadata_into(target: &mut Value, source: &Value) {
    let Some(source_obj) = source.as_object() else {
        return;
    };
    let Some(source_meta) = source_obj.decorators() else {
        return;
    };
    let Some(target_obj) = target.as_object_mut() else {
        return;
    };
    let Some(target_meta) = target_obj.decorators_mut(true) else {
        return;
    };
    if target_meta.is_empty() {
        *target_meta = source_meta.clone();
        return;
    }

    let overwritten = |name: &str, in_source_meta: bool| {
        !in_source_meta && source_obj.get(name).is_some_and(|v| !v.is_undefined())
    };

    target_meta
        .transformers
        .retain(|name, _| !overwritten(name, source_meta.transformers.contains_key(name)));
    for (name, list) in &source_meta.transformers {
        target_meta
            .transformers
            .entry(name.clone())
            .or_default()
            .extend(list.iter().cloned());
    }

    target_meta
        .configs
        .retain(|name, _| !overwritten(name, source_meta.configs.contains_key(name)));
    for (name, overrides) in &source_meta.configs {
        match target_meta.configs.get_mut(name) {
            Some(existing) => merge_override(existing, overrides),
            None => {
                target_meta.configs.insert(name.clone(), overrides.clone());
            }
        }
    }

    if target_meta.is_empty() {
        target_obj.set_decorators(None);
    }
}
