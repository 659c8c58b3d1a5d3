//! Flat command arguments

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// A primitive argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Boolean flag
    Bool(bool),
    /// Integer (ports, baud rates)
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String (port names)
    Str(String),
}

impl ArgValue {
    /// Get the value as a string slice, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<u16> for ArgValue {
    fn from(value: u16) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

/// Named arguments for a gateway command
///
/// Keys use the host's naming (`portName`, `baudRate`, `port`). Ordering is
/// stable so logs and serialized payloads are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandArgs(BTreeMap<String, ArgValue>);

impl CommandArgs {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace an argument
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up an argument
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    /// Look up a string argument
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    /// Look up an integer argument
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over arguments in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as a JSON object, for transports that speak JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
