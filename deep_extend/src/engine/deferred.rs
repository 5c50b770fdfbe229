//! Deferred-value merge engine.
//!
//! Same semantics as the synchronous engine, tolerating deferred targets,
//! sources, and property values. Sources settle strictly in call order:
//! source N's properties are fully merged before source N+1 begins, while
//! the deferred property values within one source resolve concurrently.
//! There is no cancellation: the first failure rejects the whole call.

use futures::future::join_all;

use crate::config::{ExtendConfig, IntoExtendConfig, Pair};
use crate::decorator;
use crate::error::ExtendResult;
use crate::runtime::{EngineKind, Run};
use crate::value::Value;

/// Deferred-tolerant counterpart of [`super::extend`].
///
/// ```
/// use deep_extend::{Value, extend_deferred};
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let merged = extend_deferred(
///     true,
///     Value::from(json!({})),
///     [Value::deferred(async { Ok(Value::from(json!({"a": 1}))) })],
/// )
/// .await?;
/// assert_eq!(merged, Value::from(json!({"a": 1})));
/// # Ok::<_, std::sync::Arc<deep_extend::ExtendError>>(())
/// # }).unwrap();
/// ```
///
/// # Errors
///
/// Fails as the synchronous engine does; additionally, a failed deferred
/// target, source, or property value rejects the entire call with that
/// failure. No partial result is produced and nothing is retried.
pub async fn extend_deferred<C: IntoExtendConfig>(
    config: C,
    target: Value,
    sources: impl IntoIterator<Item = Value>,
) -> ExtendResult<Value> {
    let config = config.into_extend_config();
    let target = settle(target).await?;
    super::check_target(&target)?;
    let mut run = Run::new(EngineKind::Deferred, config.clone());
    extend_in_run(&mut run, &config, target, sources.into_iter().collect()).await
}

/// Awaits a value until it is neither deferred nor externally wrapped.
pub(crate) async fn settle(value: Value) -> ExtendResult<Value> {
    let mut value = value;
    loop {
        match value {
            Value::Deferred(d) => value = d.resolve().await?,
            Value::External(ext) => value = ext.plain_value(),
            other => return Ok(other),
        }
    }
}

/// One deferred engine invocation; the recursion target for handlers whose
/// [`Run::extend_values`] runs in deferred mode.
pub(crate) async fn extend_in_run(
    run: &mut Run,
    config: &ExtendConfig,
    target: Value,
    sources: Vec<Value>,
) -> ExtendResult<Value> {
    let saved = run.enter(config)?;
    let result = merge_all(run, config, target, sources).await;
    run.exit(saved);
    result
}

async fn merge_all(
    run: &mut Run,
    config: &ExtendConfig,
    target: Value,
    sources: Vec<Value>,
) -> ExtendResult<Value> {
    let mut target = target.into_unwrapped();
    tracing::trace!(level = run.level(), sources = sources.len(), "extend (deferred)");
    for source in sources {
        let source = settle(source).await?;
        merge_source(run, config, &mut target, source).await?;
    }
    config.finish(run, target)
}

async fn merge_source(
    run: &mut Run,
    config: &ExtendConfig,
    target: &mut Value,
    source: Value,
) -> ExtendResult<()> {
    if target.is_falsy() || source.is_falsy() {
        return Ok(());
    }
    if *target == source && !config.extend_self() {
        return Ok(());
    }

    let (resolved, prop_configs) =
        decorator::resolve_source(run, config.resolve(), target, &source)?;
    let names = decorator::filter_system_properties(config.get_props(run, &resolved, target)?);

    // Read every incoming value first, then let the deferred ones settle
    // concurrently; merging waits for all of them.
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let prop_config = super::prop_config_for(config, &prop_configs, &name);
        let second = prop_config.get_second(run, &resolved, &name, target)?;
        entries.push((name, prop_config, second));
    }
    let seconds = join_all(
        entries
            .iter()
            .map(|(_, _, second)| settle(second.clone())),
    )
    .await;

    let mut pending = Vec::new();
    for ((name, prop_config, _), second) in entries.into_iter().zip(seconds) {
        let second = second?;
        let first = config.get_first(run, target, &name, &resolved)?;
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
        match result {
            None => {}
            Some(deferred @ Value::Deferred(_)) => pending.push((name, deferred)),
            Some(value) => target.write_merged(&name, value),
        }
    }

    // Nested merges and deferred handler results settle concurrently, but
    // this source is not done until every one of them has been written.
    let settled = join_all(
        pending
            .into_iter()
            .map(|(name, value)| async move { (name, settle(value).await) }),
    )
    .await;
    for (name, result) in settled {
        target.write_merged(&name, result?);
    }

    if !config.resolve() {
        decorator::merge_metadata_into(target, &source);
    }
    Ok(())
}
