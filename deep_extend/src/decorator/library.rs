//! Standard decorations.
//!
//! These cover the common per-property behaviours: computing a value from a
//! property function, skipping a property, and the usual array-combination
//! policies. Each constructor returns a fresh [`Decoration`] ready for
//! [`super::decorate`].

use crate::config::Overrides;
use crate::value::{FuncArgs, Kind, Value};

use super::Decoration;

/// The property's function is executed to produce the merged value.
///
/// Non-function values pass through unchanged.
#[must_use]
pub fn getter() -> Decoration {
    Decoration::transform(|run, current, target, source, name| match current {
        Value::Func(f) => {
            let owner = Value::Object(source.clone());
            f.call(
                run,
                FuncArgs {
                    target,
                    source: &owner,
                    name,
                },
            )
        }
        other => Ok(other),
    })
}

/// The property is skipped by the merge entirely.
#[must_use]
pub fn skip() -> Decoration {
    Decoration::transform(|_run, _current, _target, _source, _name| Ok(Value::Undefined))
}

/// The property merges deeply regardless of the call-wide `deep` flag.
#[must_use]
pub fn deep() -> Decoration {
    Decoration::config(Overrides::new().deep(true))
}

/// Array values combine as `current ++ incoming`.
#[must_use]
pub fn concat() -> Decoration {
    Decoration::config(Overrides::new().kind_handler(Kind::Array, |_run, pair| {
        let mut items = pair.first.as_array().map(<[Value]>::to_vec).unwrap_or_default();
        items.extend(pair.second.as_array().map(<[Value]>::to_vec).unwrap_or_default());
        Ok(Some(Value::Array(items)))
    }))
}

/// Array values combine as `incoming ++ current`.
#[must_use]
pub fn concat_reverse() -> Decoration {
    Decoration::config(Overrides::new().kind_handler(Kind::Array, |_run, pair| {
        let mut items = pair.second.as_array().map(<[Value]>::to_vec).unwrap_or_default();
        items.extend(pair.first.as_array().map(<[Value]>::to_vec).unwrap_or_default());
        Ok(Some(Value::Array(items)))
    }))
}
