use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Ordered map of field name → value. Key order is the declaration order
/// for schemas and the on-disk order for persisted trees.
pub type PrefMap = IndexMap<String, PrefValue>;

/// A node in a preference tree.
///
/// The set of variants is closed so that every traversal over a tree is an
/// exhaustive match rather than a runtime type probe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PrefValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<PrefValue>),
    Object(PrefMap),
}

/// Concrete kind of a value, used to name a stale shape in change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

/// Structural class of a value. Two values are compatible iff their shapes match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Array,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(s)
    }
}

impl ValueKind {
    pub fn shape(self) -> Shape {
        match self {
            ValueKind::Null | ValueKind::Boolean | ValueKind::Number | ValueKind::String => {
                Shape::Scalar
            }
            ValueKind::Array => Shape::Array,
            ValueKind::Object => Shape::Object,
        }
    }
}

impl PrefValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PrefValue::Null => ValueKind::Null,
            PrefValue::Bool(_) => ValueKind::Boolean,
            PrefValue::Number(_) => ValueKind::Number,
            PrefValue::String(_) => ValueKind::String,
            PrefValue::Array(_) => ValueKind::Array,
            PrefValue::Object(_) => ValueKind::Object,
        }
    }

    pub fn shape(&self) -> Shape {
        self.kind().shape()
    }

    /// Whether `self` may stand in for `expected` without a format migration.
    pub fn is_compatible_with(&self, expected: &PrefValue) -> bool {
        self.shape() == expected.shape()
    }

    pub fn as_object(&self) -> Option<&PrefMap> {
        match self {
            PrefValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PrefValue]> {
        match self {
            PrefValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Resolve a dotted path (`"settings.appBadge"`) below this value.
    /// An empty path resolves to `self`.
    pub fn lookup(&self, path: &str) -> Option<&PrefValue> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Short single-line rendering used in notification text.
    /// Strings are shown bare, everything else as compact JSON.
    pub fn display_short(&self) -> String {
        match self {
            PrefValue::String(s) => s.clone(),
            PrefValue::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.display_short()).collect();
                parts.join(",")
            }
            other => Value::from(other.clone()).to_string(),
        }
    }
}

impl From<Value> for PrefValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PrefValue::Null,
            Value::Bool(b) => PrefValue::Bool(b),
            Value::Number(n) => PrefValue::Number(n),
            Value::String(s) => PrefValue::String(s),
            Value::Array(items) => PrefValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                PrefValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<PrefValue> for Value {
    fn from(value: PrefValue) -> Self {
        match value {
            PrefValue::Null => Value::Null,
            PrefValue::Bool(b) => Value::Bool(b),
            PrefValue::Number(n) => Value::Number(n),
            PrefValue::String(s) => Value::String(s),
            PrefValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            PrefValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Bool(b)
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::String(s.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        PrefValue::String(s)
    }
}

impl From<i64> for PrefValue {
    fn from(n: i64) -> Self {
        PrefValue::Number(n.into())
    }
}

impl From<PrefMap> for PrefValue {
    fn from(map: PrefMap) -> Self {
        PrefValue::Object(map)
    }
}

impl From<Vec<PrefValue>> for PrefValue {
    fn from(items: Vec<PrefValue>) -> Self {
        PrefValue::Array(items)
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::from(self.clone()))
    }
}
