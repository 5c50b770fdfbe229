//! Leading-argument preparation for the dynamic entry point.
//!
//! Mirrors the loose call shape of the original surface: one optional
//! configuration (or boolean shorthand) in leading position, then the
//! target, then the sources. The typed entry points make most of this
//! unnecessary; this path exists for callers driving merges from data.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::{ExtendConfig, IntoExtendConfig, Overrides};
use crate::error::{ExtendError, ExtendResult};
use crate::value::Value;

/// One argument of a dynamic merge call.
#[derive(Debug)]
pub enum ExtendArg {
    /// A prepared configuration.
    Config(ExtendConfig),
    /// Boolean shorthand for `{deep}` in leading position.
    Bool(bool),
    /// Target or source value.
    Value(Value),
}

impl From<ExtendConfig> for ExtendArg {
    fn from(config: ExtendConfig) -> Self {
        Self::Config(config)
    }
}

impl From<&ExtendConfig> for ExtendArg {
    fn from(config: &ExtendConfig) -> Self {
        Self::Config(config.clone())
    }
}

impl From<Overrides> for ExtendArg {
    fn from(overrides: Overrides) -> Self {
        Self::Config(overrides.into_extend_config())
    }
}

impl From<bool> for ExtendArg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Value> for ExtendArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<serde_json::Value> for ExtendArg {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value.into())
    }
}

/// Applies the leading-argument rules and splits a dynamic argument list
/// into configuration, target, and sources.
///
/// # Errors
///
/// - [`ExtendError::AmbiguousConfig`] when the first and second arguments
///   are both configurations, or when a configuration appears anywhere
///   past the leading position.
/// - [`ExtendError::BadTarget`] when the target argument cannot carry
///   properties.
pub fn prepare_arguments(
    args: Vec<ExtendArg>,
) -> ExtendResult<(ExtendConfig, Value, Vec<Value>)> {
    let mut queue = VecDeque::from(args);

    let config = match queue.pop_front() {
        Some(ExtendArg::Config(config)) => {
            if matches!(queue.front(), Some(ExtendArg::Config(_))) {
                return Err(Arc::new(ExtendError::AmbiguousConfig));
            }
            config
        }
        Some(ExtendArg::Bool(deep)) => deep.into_extend_config(),
        Some(arg @ ExtendArg::Value(_)) => {
            queue.push_front(arg);
            ExtendConfig::new()
        }
        None => ExtendConfig::new(),
    };

    let target = match queue.pop_front() {
        Some(ExtendArg::Value(value)) => value.into_unwrapped(),
        Some(ExtendArg::Bool(b)) => Value::Bool(b),
        Some(ExtendArg::Config(_)) => return Err(Arc::new(ExtendError::AmbiguousConfig)),
        None => Value::Undefined,
    };
    let kind = target.kind();
    if !kind.is_container() {
        return Err(Arc::new(ExtendError::BadTarget { found: kind }));
    }

    let mut sources = Vec::with_capacity(queue.len());
    for arg in queue {
        match arg {
            ExtendArg::Value(value) => sources.push(value),
            ExtendArg::Bool(b) => sources.push(Value::Bool(b)),
            ExtendArg::Config(_) => return Err(Arc::new(ExtendError::AmbiguousConfig)),
        }
    }

    Ok((config, target, sources))
}

/// Dynamic merge entry point: prepares the argument list and runs the
/// synchronous engine.
///
/// # Errors
///
/// Fails as [`prepare_arguments`] and [`super::extend`] do.
pub fn extend_from_args(args: Vec<ExtendArg>) -> ExtendResult<Value> {
    let (config, target, sources) = prepare_arguments(args)?;
    super::extend(config, target, sources)
}
