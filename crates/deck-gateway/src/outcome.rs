//! Explicit command outcomes
//!
//! Hosts historically answered lifecycle commands with a bare boolean and
//! left the caller to judge truthiness. [`CommandOutcome`] makes the success
//! flag explicit while still accepting those bare replies.

use serde_json::Value;

/// The interpreted result of a successfully transported command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// Whether the command took effect
    pub success: bool,
    /// Optional detail supplied by the host
    pub message: Option<String>,
    /// The raw reply value
    pub value: Value,
}

impl CommandOutcome {
    /// Interpret a raw reply
    ///
    /// An object carrying a boolean `success` field is read as a structured
    /// reply (`{ "success": bool, "message": string? }`). Any other value is
    /// judged by [`is_truthy`].
    pub fn from_value(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if let Some(&Value::Bool(success)) = map.get("success") {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string);
                return Self {
                    success,
                    message,
                    value,
                };
            }
        }

        Self {
            success: is_truthy(&value),
            message: None,
            value,
        }
    }

    /// The failure text for this outcome, or `fallback` if the host gave none
    pub fn failure_message(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Truthiness of a bare reply: `false`, `null`, `0` and `""` are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
