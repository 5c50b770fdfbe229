//! Descriptor-wise merging.
//!
//! Merges property *descriptors* (plain value or getter/setter, plus
//! attributes) rather than resolved values, preserving accessor semantics
//! through a merge. All own property names are visited, enumerable or not.
//! Merged descriptors are buffered and installed on the target only after
//! every source has been processed, so partially merged accessor slots are
//! never observable mid-pass.

use std::collections::BTreeMap;

use crate::config::{ExtendConfig, IntoExtendConfig, Pair};
use crate::decorator;
use crate::error::ExtendResult;
use crate::runtime::{EngineKind, Run};
use crate::value::{Accessor, Descriptor, Kind, PropData, Value};

/// Merges property descriptors from `sources` into `target`.
///
/// Pairs of plain-value descriptors merge their inner values through the
/// ordinary configured dispatch (recursing descriptor-wise into nested
/// containers when `deep` is set) and take the incoming descriptor's
/// attributes; with `descriptors_deep` set, accessor pairs combine their
/// getter/setter halves instead of being replaced wholesale. Mismatched
/// descriptor shapes are replaced by the incoming descriptor.
///
/// # Errors
///
/// Fails as [`super::extend`] does.
pub fn extend_descriptors<C: IntoExtendConfig>(
    config: C,
    target: Value,
    sources: impl IntoIterator<Item = Value>,
) -> ExtendResult<Value> {
    let config = config.into_extend_config();
    let target = target.into_unwrapped();
    super::check_target(&target)?;
    let mut run = Run::new(EngineKind::Sync, config.clone());
    extend_in_run(&mut run, &config, target, sources.into_iter().collect())
}

fn extend_in_run(
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
    let mut target = target;
    let mut buffer: BTreeMap<String, Descriptor> = BTreeMap::new();

    for source in sources {
        let source = source.into_unwrapped();
        if source.is_falsy() {
            continue;
        }
        if target == source && !config.extend_self() {
            continue;
        }
        for name in decorator::filter_system_properties(source.all_prop_names()) {
            let Some(incoming) = source.descriptor(&name) else {
                continue;
            };
            let current = buffer
                .get(&name)
                .cloned()
                .or_else(|| target.descriptor(&name))
                .unwrap_or_else(Descriptor::undefined);
            let merged =
                merge_descriptor(run, config, current, incoming, &name, &target, &source)?;
            buffer.insert(name, merged);
        }
    }

    for (name, descriptor) in buffer {
        target.define_prop(&name, descriptor);
    }
    config.finish(run, target)
}

fn merge_descriptor(
    run: &mut Run,
    config: &ExtendConfig,
    current: Descriptor,
    incoming: Descriptor,
    name: &str,
    target: &Value,
    source: &Value,
) -> ExtendResult<Descriptor> {
    match (&current.data, &incoming.data) {
        (PropData::Value(first), PropData::Value(second)) => {
            let second_kind = second.kind();
            let value = if config.deep()
                && first.kind() == second_kind
                && matches!(second_kind, Kind::Object | Kind::Array)
            {
                extend_in_run(run, config, first.clone(), vec![second.clone()])?
            } else {
                config
                    .combine(
                        run,
                        Pair {
                            first: first.clone(),
                            second: second.clone(),
                            name,
                            target,
                            source,
                        },
                    )?
                    .unwrap_or_else(|| first.clone())
            };
            let mut merged = incoming.clone();
            merged.data = PropData::Value(value);
            Ok(merged)
        }
        (PropData::Accessor(first), PropData::Accessor(second)) => {
            if config.descriptors_deep() {
                let mut merged = incoming.clone();
                merged.data = PropData::Accessor(Accessor {
                    get: second.get.clone().or_else(|| first.get.clone()),
                    set: second.set.clone().or_else(|| first.set.clone()),
                });
                Ok(merged)
            } else {
                Ok(incoming)
            }
        }
        _ => Ok(incoming),
    }
}
