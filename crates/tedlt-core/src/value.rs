//! Property values and flattening of nested property tables

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Property key to value mapping, ordered by key for deterministic output
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A property value: a scalar or a list of values.
///
/// Strings may contain `{{ reference }}` placeholders until template
/// resolution has run. List elements are resolved one by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::List(_) => "list",
        }
    }

    /// Every string in this value, descending into lists.
    pub fn strings(&self) -> Vec<&str> {
        match self {
            PropertyValue::String(s) => vec![s.as_str()],
            PropertyValue::List(items) => items.iter().flat_map(PropertyValue::strings).collect(),
            _ => Vec::new(),
        }
    }

    /// False for NaN or infinite floats, including inside lists.
    pub fn is_finite(&self) -> bool {
        match self {
            PropertyValue::Float(f) => f.is_finite(),
            PropertyValue::List(items) => items.iter().all(PropertyValue::is_finite),
            _ => true,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Integer(i) => Value::from(*i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Convert a JSON scalar or array of scalars.
    ///
    /// Returns `None` for null, objects, and arrays holding either.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(PropertyValue::Integer)
                .or_else(|| n.as_f64().map(PropertyValue::Float)),
            Value::String(s) => Some(PropertyValue::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(PropertyValue::List),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Append `other` to this list when both are lists; otherwise replace.
    pub fn merge(&mut self, other: &PropertyValue) {
        match (self, other) {
            (PropertyValue::List(left), PropertyValue::List(right)) => {
                left.extend(right.iter().cloned());
            }
            (this, other) => *this = other.clone(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(value: Vec<PropertyValue>) -> Self {
        PropertyValue::List(value)
    }
}

/// Flatten a JSON object of properties into dotted keys.
///
/// `{"issueTypes": {"epic": "10001"}}` becomes `issueTypes.epic = "10001"`.
/// `owner` names the table being flattened and is only used in errors.
pub fn flatten_properties(
    owner: &str,
    table: &serde_json::Map<String, Value>,
) -> Result<PropertyMap> {
    let mut flattened = PropertyMap::new();
    for (key, value) in table {
        flatten_value(owner, &mut flattened, key.clone(), value)?;
    }
    Ok(flattened)
}

fn flatten_value(owner: &str, out: &mut PropertyMap, key: String, value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (nested_key, nested_value) in map {
                flatten_value(owner, out, format!("{}.{}", key, nested_key), nested_value)?;
            }
            Ok(())
        }
        // Non-finite floats (`nan`, `inf`) also arrive here: JSON cannot hold them.
        Value::Null => Err(Error::invalid_document(format!(
            "property '{}' in {} has no value or is not a finite number",
            key, owner
        ))),
        other => {
            let converted = PropertyValue::from_json(other).ok_or_else(|| {
                Error::invalid_document(format!(
                    "property '{}' in {} must be a string, finite number, boolean, \
                     or a list of those",
                    key, owner
                ))
            })?;
            out.insert(key, converted);
            Ok(())
        }
    }
}
