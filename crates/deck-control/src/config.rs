//! Per-service configuration

use std::fmt;
use std::time::Duration;

use deck_gateway::{commands, CommandArgs, ServiceId};

/// Default deadline for a single gateway command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies one controllable service and how to drive it
///
/// Built once per service type and never modified. `P` is the parameter type
/// the panel supplies when starting the service.
pub struct ServiceConfig<P> {
    service_id: ServiceId,
    start_command: &'static str,
    stop_command: &'static str,
    start_args: fn(&P) -> CommandArgs,
}

impl<P> ServiceConfig<P> {
    /// Describe a service
    pub fn new(
        service_id: ServiceId,
        start_command: &'static str,
        stop_command: &'static str,
        start_args: fn(&P) -> CommandArgs,
    ) -> Self {
        Self {
            service_id,
            start_command,
            stop_command,
            start_args,
        }
    }

    /// Service identifier
    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    /// Command that starts the service
    pub fn start_command(&self) -> &'static str {
        self.start_command
    }

    /// Command that stops the service
    pub fn stop_command(&self) -> &'static str {
        self.stop_command
    }

    /// Build the start arguments for `params`
    pub fn start_args(&self, params: &P) -> CommandArgs {
        (self.start_args)(params)
    }
}

impl<P> Clone for ServiceConfig<P> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<P> fmt::Debug for ServiceConfig<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("service_id", &self.service_id)
            .field("start_command", &self.start_command)
            .field("stop_command", &self.stop_command)
            .finish()
    }
}

/// Parameters for starting the serial bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialParams {
    /// Port name (e.g., COM3, /dev/ttyUSB0)
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
}

/// Parameters for starting the websocket server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebsocketParams {
    /// TCP port to listen on
    pub port: u16,
}

fn serial_start_args(params: &SerialParams) -> CommandArgs {
    CommandArgs::new()
        .with("portName", params.port_name.as_str())
        .with("baudRate", params.baud_rate)
}

fn websocket_start_args(params: &WebsocketParams) -> CommandArgs {
    CommandArgs::new().with("port", params.port)
}

impl ServiceConfig<SerialParams> {
    /// The serial bridge
    pub fn serial() -> Self {
        Self::new(
            ServiceId::SERIAL,
            commands::START_SERIAL_SERVER,
            commands::STOP_SERIAL_SERVER,
            serial_start_args,
        )
    }
}

impl ServiceConfig<WebsocketParams> {
    /// The websocket server
    pub fn websocket() -> Self {
        Self::new(
            ServiceId::WEBSOCKET,
            commands::START_WS_SERVER,
            commands::STOP_WS_SERVER,
            websocket_start_args,
        )
    }
}

/// Settings shared by every controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Deadline for each gateway command; `None` waits indefinitely
    pub command_timeout: Option<Duration>,
}

impl ControllerConfig {
    /// Configuration that never times out
    pub fn unbounded() -> Self {
        Self {
            command_timeout: None,
        }
    }

    /// Configuration with a specific deadline
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            command_timeout: Some(timeout),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }
}
