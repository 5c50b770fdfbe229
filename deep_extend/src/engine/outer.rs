//! Outer merge: combining values that do not carry properties.
//!
//! Operands are wrapped in a synthetic single-property container, the merge
//! runs one level "outside" the user's rules (forcing a deep step at the
//! wrapper level and offsetting the reported depth so handlers observe
//! unwrapped levels), and the container is unwrapped on the way out.

use crate::config::{IntoExtendConfig, Overrides, Pair};
use crate::error::ExtendResult;
use crate::runtime::Run;
use crate::value::{Kind, Object, Value};

/// Synthetic property operands are wrapped under.
const OUTER_PROP: &str = "outer";

/// Merges arbitrary values as if they were properties of some object.
///
/// ```
/// use deep_extend::{Kind, Overrides, Value, extend_outer};
///
/// let concat = Overrides::new().kind_handler(Kind::String, |_run, pair| {
///     let mut s = pair.first.as_str().unwrap_or_default().to_owned();
///     s.push_str(pair.second.as_str().unwrap_or_default());
///     Ok(Some(Value::String(s)))
/// });
/// assert_eq!(
///     extend_outer(concat, Value::from("1"), [Value::from("2")])?,
///     Value::from("12"),
/// );
/// # Ok::<_, std::sync::Arc<deep_extend::ExtendError>>(())
/// ```
///
/// # Errors
///
/// Fails as [`super::extend`] does, except that any target value is
/// acceptable (it is wrapped before the engine sees it).
pub fn extend_outer<C: IntoExtendConfig>(
    config: C,
    target: Value,
    sources: impl IntoIterator<Item = Value>,
) -> ExtendResult<Value> {
    let config = config.into_extend_config().derive_primary(outer_overrides());
    let wrapped: Vec<Value> = sources.into_iter().map(wrap).collect();
    let result = super::extend(config, wrap(target), wrapped)?;
    Ok(unwrap(&result))
}

/// Deferred-tolerant counterpart of [`extend_outer`]; wrapped operands may
/// be (or contain) deferred values.
///
/// # Errors
///
/// Fails as [`super::deferred::extend_deferred`] does.
pub async fn extend_outer_deferred<C: IntoExtendConfig>(
    config: C,
    target: Value,
    sources: impl IntoIterator<Item = Value>,
) -> ExtendResult<Value> {
    let config = config.into_extend_config().derive_primary(outer_overrides());
    let wrapped: Vec<Value> = sources.into_iter().map(wrap).collect();
    let result = super::deferred::extend_deferred(config, wrap(target), wrapped).await?;
    Ok(unwrap(&result))
}

fn wrap(value: Value) -> Value {
    let mut obj = Object::new();
    obj.insert(OUTER_PROP, value);
    Value::Object(obj)
}

fn unwrap(result: &Value) -> Value {
    result
        .get_prop(OUTER_PROP)
        .cloned()
        .unwrap_or(Value::Undefined)
}

fn outer_overrides() -> Overrides {
    Overrides::new()
        .level_offset(-1)
        .kind_handler(Kind::Object, outer_container)
        .kind_handler(Kind::Array, outer_container)
        .different_handler(outer_different)
}

/// At the wrapper level containers always merge deeply, so whole arrays and
/// objects combine through the user's per-kind rules; below it the next
/// layer's policy applies untouched.
fn outer_container(run: &mut Run, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
    if run.level() == -1 {
        let Pair { first, second, .. } = pair;
        run.extend_values(first, vec![second]).map(Some)
    } else {
        run.call_next(pair)
    }
}

fn outer_different(run: &mut Run, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
    if run.level() == -1 && matches!(pair.second.kind(), Kind::Object | Kind::Array) {
        let fresh = Value::empty_like(&pair.second);
        let Pair { second, .. } = pair;
        run.extend_values(fresh, vec![second]).map(Some)
    } else {
        run.call_next(pair)
    }
}
