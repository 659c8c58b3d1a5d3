//! Error types for the control layer

use deck_gateway::{GatewayError, ServiceId};
use thiserror::Error;

use crate::state::ServiceStatus;

/// Errors that can occur in the control layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// Another transition is already in flight
    #[error("{service} is {status}")]
    Busy {
        /// Service that refused the request
        service: ServiceId,
        /// Transitional status it is in
        status: ServiceStatus,
    },

    /// Start requested while the service runs
    #[error("{0} is already running")]
    AlreadyRunning(ServiceId),

    /// Stop requested while the service is stopped
    #[error("{0} is not running")]
    NotRunning(ServiceId),

    /// A transition the state machine does not allow
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition {
        /// Status before
        from: ServiceStatus,
        /// Requested status
        to: ServiceStatus,
    },

    /// Start requested without a selected port
    #[error("no serial port selected")]
    NoPortSelected,

    /// Selected port is not in the catalog
    #[error("port {0} is not in the catalog")]
    UnknownPort(String),

    /// Parameters can only change while the service is stopped
    #[error("{service} settings are locked while {status}")]
    SettingsLocked {
        /// Service whose settings were edited
        service: ServiceId,
        /// Current status
        status: ServiceStatus,
    },

    /// Gateway failure
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
