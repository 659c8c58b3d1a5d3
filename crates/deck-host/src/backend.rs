//! Command dispatch for the simulated host

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use deck_gateway::{commands, CommandArgs, EventBus, Transport};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::HostError;
use crate::ports::PortSource;
use crate::serial::{ScaleSimulator, SerialBridge};
use crate::websocket::WsServer;

const SERIAL: &str = "serial";
const WEBSOCKET: &str = "websocket";

/// In-process host answering the lifecycle and discovery commands
pub struct HostBackend {
    config: HostConfig,
    ports: Box<dyn PortSource>,
    bus: EventBus,
    serial: Mutex<Option<SerialBridge>>,
    websocket: Mutex<Option<WsServer>>,
}

impl HostBackend {
    /// Create a host with both services stopped
    pub fn new(config: HostConfig, ports: Box<dyn PortSource>) -> Self {
        Self {
            config,
            ports,
            bus: EventBus::new(),
            serial: Mutex::new(None),
            websocket: Mutex::new(None),
        }
    }

    /// Bus the serial bridge publishes on
    pub fn events(&self) -> EventBus {
        self.bus.clone()
    }

    /// Settings this host runs with
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Check if the serial bridge is running
    pub fn serial_running(&self) -> bool {
        lock(&self.serial).is_some()
    }

    /// Address of the running websocket server
    pub fn ws_address(&self) -> Option<String> {
        lock(&self.websocket).as_ref().map(WsServer::address)
    }

    /// List serial ports
    pub fn list_ports(&self) -> Result<Vec<String>, HostError> {
        let ports = self.ports.list()?;
        debug!("Host lists {} port(s)", ports.len());
        Ok(ports)
    }

    /// Open `port_name` and start publishing readings
    pub fn start_serial(&self, port_name: &str, baud_rate: u32) -> Result<(), HostError> {
        let mut serial = lock(&self.serial);
        if serial.is_some() {
            return Err(HostError::AlreadyRunning(SERIAL));
        }

        if !self.list_ports()?.iter().any(|p| p == port_name) {
            return Err(HostError::PortNotFound(port_name.to_string()));
        }
        if self.config.busy_ports.iter().any(|p| p == port_name) {
            return Err(HostError::PortBusy(port_name.to_string()));
        }

        *serial = Some(SerialBridge::start(
            port_name,
            baud_rate,
            self.bus.clone(),
            self.config.reading_interval,
            ScaleSimulator::default(),
        ));
        Ok(())
    }

    /// Stop the serial bridge
    pub fn stop_serial(&self) -> Result<(), HostError> {
        let bridge = lock(&self.serial)
            .take()
            .ok_or(HostError::NotRunning(SERIAL))?;
        info!("Closing {}", bridge.port_name());
        bridge.stop();
        Ok(())
    }

    /// Start the websocket server on `port`
    pub fn start_ws(&self, port: u16) -> Result<(), HostError> {
        let mut websocket = lock(&self.websocket);
        if websocket.is_some() {
            return Err(HostError::AlreadyRunning(WEBSOCKET));
        }
        if self.config.reserved_ws_ports.contains(&port) {
            return Err(HostError::AddressInUse(port));
        }

        *websocket = Some(WsServer::start(port));
        Ok(())
    }

    /// Stop the websocket server
    pub fn stop_ws(&self) -> Result<(), HostError> {
        let server = lock(&self.websocket)
            .take()
            .ok_or(HostError::NotRunning(WEBSOCKET))?;
        server.stop();
        Ok(())
    }

    /// Run one command
    pub fn dispatch(&self, command: &str, args: &CommandArgs) -> Result<Value, HostError> {
        match command {
            commands::READ_SERIAL_PORT => {
                let ports = self.list_ports()?;
                Ok(Value::from(ports))
            }
            commands::START_SERIAL_SERVER => {
                let port_name = args
                    .get_str("portName")
                    .filter(|name| !name.is_empty())
                    .ok_or(HostError::InvalidArgument("portName"))?;
                let baud_rate = args
                    .get_i64("baudRate")
                    .and_then(|rate| u32::try_from(rate).ok())
                    .filter(|rate| *rate > 0)
                    .ok_or(HostError::InvalidArgument("baudRate"))?;
                self.start_serial(port_name, baud_rate)?;
                Ok(Value::Bool(true))
            }
            commands::STOP_SERIAL_SERVER => {
                self.stop_serial()?;
                Ok(Value::Bool(true))
            }
            commands::START_WS_SERVER => {
                let port = args
                    .get_i64("port")
                    .and_then(|port| u16::try_from(port).ok())
                    .filter(|port| *port > 0)
                    .ok_or(HostError::InvalidArgument("port"))?;
                self.start_ws(port)?;
                Ok(Value::Bool(true))
            }
            commands::STOP_WS_SERVER => {
                self.stop_ws()?;
                Ok(Value::Bool(true))
            }
            other => Err(HostError::UnknownCommand(other.to_string())),
        }
    }
}

#[async_trait]
impl Transport for HostBackend {
    async fn call(&self, command: &str, args: CommandArgs) -> Result<Value, Value> {
        if !self.config.response_delay.is_zero() {
            tokio::time::sleep(self.config.response_delay).await;
        }

        debug!("Host received {} {}", command, args.to_json());
        self.dispatch(command, &args).map_err(|err| {
            warn!("Host rejected {}: {}", command, err);
            err.to_reason()
        })
    }
}

impl std::fmt::Debug for HostBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBackend")
            .field("config", &self.config)
            .field("serial_running", &self.serial_running())
            .field("ws_address", &self.ws_address())
            .finish()
    }
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
