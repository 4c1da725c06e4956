//! Runtime value model for Strand routines.
//!
//! Every hand-off between a routine and its caller — yielded values,
//! injected resume arguments, thrown errors — moves one of these. Values
//! are owned and `Send` so they can cross the helper-thread boundary of the
//! stackful coroutine engine without shared state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A Strand runtime value.
///
/// `Undefined` is the absence of a value (what a `next()` on a finished
/// generator reports); `Null` is the language-level null literal. The two
/// are distinct, as in the source language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(items)
    }

    pub fn new_map(fields: BTreeMap<String, Value>) -> Self {
        Value::Map(fields)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Short type tag used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

// ---------------------------------------------------------------------------
// JSON interchange
// ---------------------------------------------------------------------------

/// Convert a Strand value to a `serde_json` value.
///
/// `Undefined` has no JSON counterpart and maps to `null`.
pub fn value_to_json(val: &Value) -> serde_json::Value {
    match val {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::json!(*n),
        Value::Float(x) => serde_json::json!(*x),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(fields) => {
            let obj: serde_json::Map<String, serde_json::Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
    }
}

/// Convert a `serde_json` value to a Strand value.
pub fn json_to_value(val: &serde_json::Value) -> Value {
    match val {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => Value::new_list(arr.iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            let map: BTreeMap<String, Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect();
            Value::new_map(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_nested_values() {
        let v = Value::new_list(vec![
            Value::Int(1),
            Value::String("two".into()),
            Value::new_list(vec![Value::Bool(true)]),
        ]);
        assert_eq!(v.to_string(), "[1, two, [true]]");
    }

    #[test]
    fn undefined_and_null_are_distinct() {
        assert_ne!(Value::Undefined, Value::Null);
        assert!(Value::Undefined.is_undefined());
        assert!(!Value::Null.is_undefined());
    }

    #[test]
    fn json_round_trip_loses_only_undefined() {
        let mut fields = BTreeMap::new();
        fields.insert("n".to_string(), Value::Int(7));
        fields.insert("s".to_string(), Value::String("hi".into()));
        let v = Value::new_map(fields);
        assert_eq!(json_to_value(&value_to_json(&v)), v);

        // Undefined degrades to null through JSON.
        assert_eq!(json_to_value(&value_to_json(&Value::Undefined)), Value::Null);
    }
}
