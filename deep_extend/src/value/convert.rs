//! Conversions between engine values and `serde_json` trees.

use std::sync::Arc;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number};

use crate::error::ExtendError;

use super::{Object, PropData, Value};

impl Serialize for Value {
    /// Serialises plain trees; `Undefined` becomes `null` at the top level
    /// and is dropped from objects. Functions, deferred values, and
    /// accessor properties have no data representation and fail.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(obj) => {
                let mut map = serializer.serialize_map(None)?;
                for name in obj.all_prop_names() {
                    match obj.descriptor(&name).map(|d| d.data) {
                        None | Some(PropData::Value(Self::Undefined)) => {}
                        Some(PropData::Value(value)) => {
                            map.serialize_entry(&name, &value)?;
                        }
                        Some(PropData::Accessor(_)) => {
                            return Err(S::Error::custom(
                                "cannot serialise an accessor property",
                            ));
                        }
                    }
                }
                map.end()
            }
            Self::External(ext) => ext.plain_value().serialize(serializer),
            other => Err(S::Error::custom(format!(
                "cannot serialise a {} value",
                other.kind()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    /// Deserialises any self-describing data into a plain value tree.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = Arc<ExtendError>;

    /// Converts back to a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`ExtendError::UnsupportedValue`] for values with no JSON
    /// representation (functions, deferred values, accessor properties);
    /// `Undefined` is mapped to `null` at the top level and dropped from
    /// objects, matching JSON serialisation of sparse data.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Undefined | Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => Ok(Self::Number(n)),
            Value::String(s) => Ok(Self::String(s)),
            Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Value::Object(obj) => {
                let mut map = Map::new();
                for name in obj.all_prop_names() {
                    let Some(descriptor) = obj.descriptor(&name) else {
                        continue;
                    };
                    match descriptor.data {
                        super::PropData::Value(Value::Undefined) => {}
                        super::PropData::Value(v) => {
                            map.insert(name, Self::try_from(v)?);
                        }
                        super::PropData::Accessor(_) => {
                            return Err(Arc::new(ExtendError::UnsupportedValue {
                                kind: super::Kind::Function,
                            }));
                        }
                    }
                }
                Ok(Self::Object(map))
            }
            other => Err(Arc::new(ExtendError::UnsupportedValue {
                kind: other.kind(),
            })),
        }
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Self::Object(obj)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(Number::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(Number::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(Number::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(Number::from(n))
    }
}

impl From<f64> for Value {
    /// Non-finite floats become [`Value::Null`], matching JSON number
    /// construction.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<super::Func> for Value {
    fn from(f: super::Func) -> Self {
        Self::Func(f)
    }
}
