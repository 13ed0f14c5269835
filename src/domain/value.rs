//! Raw, loader-produced configuration values
//!
//! A `RawValue` is the untyped structure a source file parses into before it
//! is merged into the tree: scalars, positional lists and keyed maps,
//! arbitrarily nested.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keyed map with insertion order preserved.
pub type RawMap = IndexMap<String, RawValue>;

/// Untyped configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<RawValue>),
    Map(RawMap),
}

impl RawValue {
    /// Empty keyed map.
    pub fn map() -> Self {
        RawValue::Map(RawMap::new())
    }

    /// Builds a map from `(key, value)` pairs, keeping their order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        RawValue::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// True for a positional list: a `List`, or a `Map` whose keys are
    /// exactly `"0".."n-1"` in order.
    ///
    /// An empty map counts as sequential, mirroring how an empty container
    /// has no keys that could make it associative.
    pub fn is_sequential(&self) -> bool {
        match self {
            RawValue::List(_) => true,
            RawValue::Map(map) => map
                .keys()
                .enumerate()
                .all(|(i, key)| *key == i.to_string()),
            _ => false,
        }
    }

    /// True for a map with at least one non-positional key.
    pub fn is_keyed(&self) -> bool {
        matches!(self, RawValue::Map(_)) && !self.is_sequential()
    }

    /// True for lists and maps.
    pub fn is_container(&self) -> bool {
        matches!(self, RawValue::List(_) | RawValue::Map(_))
    }

    /// Copy with every `null` map entry and list item removed, recursively.
    ///
    /// Formats without a null (TOML) can then represent the value.
    pub fn without_nulls(&self) -> RawValue {
        match self {
            RawValue::List(items) => RawValue::List(
                items
                    .iter()
                    .filter(|item| !matches!(item, RawValue::Null))
                    .map(RawValue::without_nulls)
                    .collect(),
            ),
            RawValue::Map(map) => RawValue::Map(
                map.iter()
                    .filter(|(_, value)| !matches!(value, RawValue::Null))
                    .map(|(key, value)| (key.clone(), value.without_nulls()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Emptiness check used for "not set" decisions.
    ///
    /// `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty containers are empty.
    pub fn is_empty_value(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Bool(b) => !b,
            RawValue::Integer(i) => *i == 0,
            RawValue::Float(f) => *f == 0.0,
            RawValue::String(s) => s.is_empty() || s == "0",
            RawValue::List(items) => items.is_empty(),
            RawValue::Map(map) => map.is_empty(),
        }
    }

    /// Elements of a positional value, in order.
    ///
    /// Returns `None` for scalars and keyed maps.
    pub fn sequence_items(&self) -> Option<Vec<&RawValue>> {
        match self {
            RawValue::List(items) => Some(items.iter().collect()),
            RawValue::Map(map) if self.is_sequential() => Some(map.values().collect()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(f) => Some(*f),
            RawValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            RawValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short type label for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Integer(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::String(_) => "string",
            RawValue::List(_) => "list",
            RawValue::Map(_) => "map",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Integer(i) => write!(f, "{}", i),
            RawValue::Float(x) => write!(f, "{}", x),
            RawValue::String(s) => write!(f, "{}", s),
            RawValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            RawValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<i32> for RawValue {
    fn from(i: i32) -> Self {
        RawValue::Integer(i64::from(i))
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<RawMap> for RawValue {
    fn from(map: RawMap) -> Self {
        RawValue::Map(map)
    }
}

impl From<toml::Value> for RawValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => RawValue::String(s),
            toml::Value::Integer(i) => RawValue::Integer(i),
            toml::Value::Float(f) => RawValue::Float(f),
            toml::Value::Boolean(b) => RawValue::Bool(b),
            toml::Value::Datetime(dt) => RawValue::String(dt.to_string()),
            toml::Value::Array(items) => {
                RawValue::List(items.into_iter().map(RawValue::from).collect())
            }
            toml::Value::Table(table) => RawValue::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (k, RawValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Integer(i),
                None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => RawValue::String(s),
            serde_json::Value::Array(items) => {
                RawValue::List(items.into_iter().map(RawValue::from).collect())
            }
            serde_json::Value::Object(object) => RawValue::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (k, RawValue::from(v)))
                    .collect(),
            ),
        }
    }
}
