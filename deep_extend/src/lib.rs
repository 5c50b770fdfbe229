//! Configurable deep-merge ("extend") engine.
//!
//! This crate combines a target value with one or more source values,
//! producing a merged result according to pluggable per-kind merge rules.
//! A chain of partial configuration overrides composes into one effective
//! [`ExtendConfig`], which drives a recursive merge over arbitrary property
//! trees, including deferred (future) values and decorated per-property
//! behaviour.
//!
//! # Quick start
//!
//! ```
//! use deep_extend::{Value, extend};
//! use serde_json::json;
//!
//! let merged = extend(
//!     true, // boolean shorthand for {deep: true}
//!     Value::from(json!({})),
//!     [
//!         Value::from(json!({"server": {"host": "localhost"}})),
//!         Value::from(json!({"server": {"port": 8080}})),
//!     ],
//! )?;
//! assert_eq!(
//!     merged,
//!     Value::from(json!({"server": {"host": "localhost", "port": 8080}})),
//! );
//! # Ok::<_, std::sync::Arc<deep_extend::ExtendError>>(())
//! ```
//!
//! # Custom merge rules
//!
//! Configurations are layered: deriving adds a leaf without mutating
//! ancestors, unspecified entries fall back through the lineage, and a
//! handler can delegate to the layer it overrides with
//! [`Run::call_next`].
//!
//! ```
//! use deep_extend::{ExtendConfig, Kind, Overrides, Value, extend};
//! use serde_json::json;
//!
//! let config = ExtendConfig::with(Overrides::new().deep(true).kind_handler(
//!     Kind::Array,
//!     |_run, pair| {
//!         let mut items = pair.first.as_array().unwrap_or_default().to_vec();
//!         items.extend(pair.second.as_array().unwrap_or_default().to_vec());
//!         Ok(Some(Value::Array(items)))
//!     },
//! ));
//! let merged = extend(
//!     &config,
//!     Value::from(json!({})),
//!     [Value::from(json!({"a": ["1"]})), Value::from(json!({"a": [3]}))],
//! )?;
//! assert_eq!(merged, Value::from(json!({"a": ["1", 3]})));
//! # Ok::<_, std::sync::Arc<deep_extend::ExtendError>>(())
//! ```

mod config;
pub mod decorator;
mod engine;
mod error;
mod result_ext;
mod runtime;
mod value;

pub use config::{
    DEFAULT_MAX_RECURSIONS, ExtendConfig, FinishFn, FirstFn, HandlerFn, IntoExtendConfig,
    Method, Overrides, Pair, PropsFn, SecondFn, Tier, enumerate,
};
pub use decorator::{DecoratorSet, Decoration, Transformer, decorate};
pub use engine::deferred::extend_deferred;
pub use engine::{
    ExtendArg, extend, extend_descriptors, extend_from_args, extend_outer,
    extend_outer_deferred, prepare_arguments,
};
pub use error::{ExtendError, ExtendResult};
pub use result_ext::{HandlerResultExt, IntoExtendResult};
pub use runtime::{Bag, EngineKind, Run};
pub use value::{
    Accessor, Deferred, Descriptor, Func, FuncArgs, Kind, Object, PlainValue, PropData, Value,
};
