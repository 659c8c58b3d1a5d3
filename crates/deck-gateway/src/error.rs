//! Error types for the command gateway

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Fallback text when a failure reason carries no usable message
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Errors surfaced by the command gateway
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The backend rejected the command; the reason is already normalized
    #[error("{0}")]
    Rejected(String),

    /// No reply arrived before the deadline
    #[error("{command} timed out after {}ms", .after.as_millis())]
    TimedOut {
        /// Command that was invoked
        command: String,
        /// Deadline that expired
        after: Duration,
    },

    /// The backend replied, but not with the expected shape
    #[error("unexpected reply to {command}: {reason}")]
    MalformedReply {
        /// Command that was invoked
        command: String,
        /// What was wrong with the reply
        reason: String,
    },
}

impl GatewayError {
    /// Build a rejection from a raw backend failure reason
    pub fn from_reason(reason: &Value) -> Self {
        GatewayError::Rejected(normalize_reason(reason))
    }
}

/// Normalize a backend failure reason into human-readable text
///
/// Plain strings pass through; structured values yield their `message`
/// field. Anything else, including empty text, becomes [`UNKNOWN_ERROR`].
pub fn normalize_reason(reason: &Value) -> String {
    let text = match reason {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("message").and_then(Value::as_str),
        _ => None,
    };

    match text {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => UNKNOWN_ERROR.to_string(),
    }
}
