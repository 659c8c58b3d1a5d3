//! Headless panel models
//!
//! Each panel owns one [`LifecycleController`](crate::LifecycleController)
//! and the inputs its view edits. Views render from the panel and call its
//! methods; they hold no logic of their own. Dropping a panel detaches any
//! live telemetry subscription.

mod serial;
mod websocket;

pub use serial::{SerialPanel, DEFAULT_BAUD_RATE};
pub use websocket::{WebsocketPanel, DEFAULT_WS_PORT, LISTEN_HOST};

use deck_gateway::ServiceId;

use crate::error::ControlError;
use crate::state::ServiceStatus;

/// Inputs may only change while the service is stopped
fn ensure_editable(service: ServiceId, status: ServiceStatus) -> Result<(), ControlError> {
    if status == ServiceStatus::Stopped {
        Ok(())
    } else {
        Err(ControlError::SettingsLocked { service, status })
    }
}
