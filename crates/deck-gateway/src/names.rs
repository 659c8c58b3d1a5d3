//! Command names, event topics and service identifiers shared with the host

use std::fmt;

/// Commands understood by the host backend
pub mod commands {
    /// Start the serial bridge. Arguments: `portName` (string), `baudRate` (number)
    pub const START_SERIAL_SERVER: &str = "start_serial_server";
    /// Stop the serial bridge. No arguments
    pub const STOP_SERIAL_SERVER: &str = "stop_serial_server";
    /// List available serial ports. No arguments
    pub const READ_SERIAL_PORT: &str = "read_serial_port";
    /// Start the websocket server. Arguments: `port` (number)
    pub const START_WS_SERVER: &str = "start_ws_server";
    /// Stop the websocket server. No arguments
    pub const STOP_WS_SERVER: &str = "stop_ws_server";
}

/// Event topics pushed by the host backend
pub mod topics {
    /// String-formatted numeric readings from the serial bridge
    pub const SERIAL_DATA: &str = "serial_data";
}

/// Stable identifier of a controllable service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(&'static str);

impl ServiceId {
    /// The serial-port bridge
    pub const SERIAL: ServiceId = ServiceId("serial");
    /// The websocket server
    pub const WEBSOCKET: ServiceId = ServiceId("websocket");

    /// Create a service identifier
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Get the raw identifier
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
