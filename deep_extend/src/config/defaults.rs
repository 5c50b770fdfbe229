//! The built-in default layer: one handler for every kind, plus the default
//! accessors and enumeration.

use std::sync::{Arc, OnceLock};

use crate::error::ExtendResult;
use crate::runtime::Run;
use crate::value::{Kind, Value};

use super::overrides::{Method, Overrides, Pair};
use super::{Layer, Tier};

/// Default recursion ceiling.
pub const DEFAULT_MAX_RECURSIONS: usize = 20;

/// The shared root layer every configuration lineage ends in.
pub(super) fn default_layer() -> Arc<Layer> {
    static DEFAULT: OnceLock<Arc<Layer>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| {
            Arc::new(Layer {
                tier: Tier::Default,
                table: default_table(),
                parent: None,
            })
        })
        .clone()
}

fn default_table() -> Overrides {
    Overrides::new()
        .deep(false)
        .extend_self(false)
        .resolve(true)
        .max_recursions(DEFAULT_MAX_RECURSIONS)
        .level_offset(0)
        .descriptors_deep(false)
        .extend_prop(extend_prop)
        .different_handler(extend_different)
        .kind_handler(Kind::Object, extend_container)
        .kind_handler(Kind::Array, extend_container)
        .default_handler(|_run, pair| Ok(Some(pair.second)))
        .get_props(|_run, source, _target| Ok(source.prop_names()))
        .get_first(|run, target, name, _source| target.get_prop_resolved(run, name))
        .get_second(|run, source, name, _target| source.get_prop_resolved(run, name))
        .finish(|_run, target| Ok(target))
}

/// Primary dispatch: pick the similar-kind handler when both values classify
/// alike, otherwise the mismatched-kind handler.
fn extend_prop(run: &mut Run, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
    let second_kind = pair.second.kind();
    if pair.first.kind() == second_kind {
        run.dispatch(&[Method::Kind(second_kind), Method::Default], pair)
    } else {
        run.dispatch(&[Method::Different], pair)
    }
}

/// Mismatched-kind policy: an absent incoming value keeps the current one;
/// an incoming container is deep-cloned through the engine when `deep` is
/// on; everything else replaces.
fn extend_different(run: &mut Run, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
    match pair.second.kind() {
        Kind::Undefined => Ok(None),
        Kind::Object | Kind::Array if run.deep() => {
            let fresh = Value::empty_like(&pair.second);
            run.extend_values(fresh, vec![pair.second]).map(Some)
        }
        _ => Ok(Some(pair.second)),
    }
}

/// Similar-kind policy for objects and arrays: recurse when `deep` is on,
/// otherwise fall through to the generic replacement policy.
fn extend_container(run: &mut Run, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
    if run.deep() {
        let Pair { first, second, .. } = pair;
        run.extend_values(first, vec![second]).map(Some)
    } else {
        run.dispatch(&[Method::Default], pair)
    }
}

/// Default property enumeration, usable from `get_props` overrides that
/// want to post-process the standard name list.
///
/// # Errors
///
/// Never fails; the result type matches the enumeration contract.
pub fn enumerate(source: &Value) -> ExtendResult<Vec<String>> {
    Ok(source.prop_names())
}
