//! Error types for the host backend

use serde_json::{json, Value};
use thiserror::Error;

/// Errors the host backend reports back through the gateway
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// Service is already running
    #[error("{0} service is already running")]
    AlreadyRunning(&'static str),

    /// Service is not running
    #[error("{0} service is not running")]
    NotRunning(&'static str),

    /// Command not recognized
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Required argument absent or of the wrong type
    #[error("missing or invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// Port is not present on this machine
    #[error("failed to open port {0}: no such port")]
    PortNotFound(String),

    /// Port busy or in use
    #[error("port {0} is busy or in use")]
    PortBusy(String),

    /// Websocket listen port unavailable
    #[error("failed to bind 127.0.0.1:{0}: address in use")]
    AddressInUse(u16),
}

impl HostError {
    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            HostError::AlreadyRunning(_) => "already_running",
            HostError::NotRunning(_) => "not_running",
            HostError::UnknownCommand(_) => "unknown_command",
            HostError::InvalidArgument(_) => "invalid_argument",
            HostError::EnumerationFailed(_) => "enumeration_failed",
            HostError::PortNotFound(_) | HostError::PortBusy(_) => "open_failed",
            HostError::AddressInUse(_) => "bind_failed",
        }
    }

    /// The failure reason sent over the wire
    ///
    /// State conflicts go out as plain strings; I/O and argument failures as
    /// `{ "kind", "message" }` objects.
    pub fn to_reason(&self) -> Value {
        match self {
            HostError::AlreadyRunning(_)
            | HostError::NotRunning(_)
            | HostError::UnknownCommand(_) => Value::String(self.to_string()),
            _ => json!({
                "kind": self.kind(),
                "message": self.to_string(),
            }),
        }
    }
}
