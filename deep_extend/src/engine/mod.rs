//! Merge execution.
//!
//! The synchronous engine walks each source's enumerated properties,
//! resolves per-property configuration and decorators, dispatches the
//! configured combination per classified kind pair, and writes results into
//! the target. Variants layer on top: a deferred-value engine, an "outer"
//! wrapper for non-property-bearing values, and a descriptor-wise merge.

pub mod deferred;
mod descriptors;
mod outer;
mod prepare;

use std::collections::BTreeMap;

use crate::config::{ExtendConfig, IntoExtendConfig, Overrides, Pair};
use crate::decorator;
use crate::error::{ExtendError, ExtendResult};
use crate::runtime::{EngineKind, Run};
use crate::value::Value;

pub use descriptors::extend_descriptors;
pub use outer::{extend_outer, extend_outer_deferred};
pub use prepare::{ExtendArg, extend_from_args, prepare_arguments};

/// Merges `sources` into `target`, left to right, and returns the result.
///
/// The leading argument accepts the usual shorthands: a configuration, a
/// bare [`Overrides`] table, `true` for `{deep: true}`, or `()`/`false` for
/// the default rules. Sources are never mutated.
///
/// ```
/// use deep_extend::{Value, extend};
/// use serde_json::json;
///
/// let merged = extend(
///     true,
///     Value::from(json!({})),
///     [Value::from(json!({"a": {"a": "1"}})), Value::from(json!({"a": {"b": 2}}))],
/// )?;
/// assert_eq!(merged, Value::from(json!({"a": {"a": "1", "b": 2}})));
/// # Ok::<_, std::sync::Arc<deep_extend::ExtendError>>(())
/// ```
///
/// # Errors
///
/// Fails when the target cannot carry properties, when a required handler
/// is missing from the configuration lineage, when the recursion ceiling is
/// exceeded, or when any handler or accessor fails.
pub fn extend<C: IntoExtendConfig>(
    config: C,
    target: Value,
    sources: impl IntoIterator<Item = Value>,
) -> ExtendResult<Value> {
    let config = config.into_extend_config();
    let target = target.into_unwrapped();
    check_target(&target)?;
    let mut run = Run::new(EngineKind::Sync, config.clone());
    extend_in_run(&mut run, &config, target, sources.into_iter().collect())
}

/// Rejects targets that cannot carry properties.
pub(crate) fn check_target(target: &Value) -> ExtendResult<()> {
    let kind = target.kind();
    if kind.is_container() {
        Ok(())
    } else {
        Err(std::sync::Arc::new(ExtendError::BadTarget { found: kind }))
    }
}

/// One engine invocation: brackets the recursion level, merges every
/// source, and applies the finish hook. Also the recursion target for
/// handlers calling [`Run::extend_values`] in the synchronous engine.
pub(crate) fn extend_in_run(
    run: &mut Run,
    config: &ExtendConfig,
    target: Value,
    sources: Vec<Value>,
) -> ExtendResult<Value> {
    let saved = run.enter(config)?;
    let result = merge_all(run, config, target, sources);
    run.exit(saved);
    result
}

fn merge_all(
    run: &mut Run,
    config: &ExtendConfig,
    target: Value,
    sources: Vec<Value>,
) -> ExtendResult<Value> {
    let mut target = target.into_unwrapped();
    tracing::trace!(level = run.level(), sources = sources.len(), "extend");
    for source in sources {
        merge_source(run, config, &mut target, source)?;
    }
    config.finish(run, target)
}

fn merge_source(
    run: &mut Run,
    config: &ExtendConfig,
    target: &mut Value,
    source: Value,
) -> ExtendResult<()> {
    if target.is_falsy() || source.is_falsy() {
        return Ok(());
    }
    let source = source.into_unwrapped();
    if *target == source && !config.extend_self() {
        return Ok(());
    }

    let (resolved, prop_configs) =
        decorator::resolve_source(run, config.resolve(), target, &source)?;
    let names = decorator::filter_system_properties(config.get_props(run, &resolved, target)?);

    for name in names {
        let prop_config = prop_config_for(config, &prop_configs, &name);
        let first = config.get_first(run, target, &name, &resolved)?;
        let second = prop_config.get_second(run, &resolved, &name, target)?;
        let result = prop_config.combine(
            run,
            Pair {
                first,
                second,
                name: &name,
                target,
                source: &resolved,
            },
        )?;
        if let Some(value) = result {
            target.write_merged(&name, value);
        }
    }

    if !config.resolve() {
        decorator::merge_metadata_into(target, &source);
    }
    Ok(())
}

/// Specialises the call configuration for one property when a decorator
/// recorded an override for it.
pub(crate) fn prop_config_for(
    config: &ExtendConfig,
    prop_configs: &BTreeMap<String, Overrides>,
    name: &str,
) -> ExtendConfig {
    prop_configs
        .get(name)
        .map_or_else(|| config.clone(), |overrides| config.derive(overrides.clone()))
}
