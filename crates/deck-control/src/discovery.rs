//! Port discovery
//!
//! Lists serial ports through the gateway and keeps them in a
//! [`PortCatalog`]. Every successful refresh replaces the catalog and clears
//! the selection, so a port chosen from a stale list is never used silently.

use std::time::Duration;

use deck_gateway::{commands, CommandArgs, CommandGateway, GatewayError};
use tracing::{info, warn};

use crate::config::ControllerConfig;
use crate::error::ControlError;
use crate::notice::{self, Notice, NoticeSink};

/// Ports offered before the first refresh
pub const FALLBACK_PORTS: &[&str] = &["COM1", "COM2"];

/// Ordered list of available ports plus the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCatalog {
    ports: Vec<String>,
    selected: Option<String>,
}

impl PortCatalog {
    /// Create a catalog with nothing selected
    pub fn new(ports: Vec<String>) -> Self {
        Self {
            ports,
            selected: None,
        }
    }

    /// Catalog seeded with [`FALLBACK_PORTS`], first entry selected
    pub fn with_fallback() -> Self {
        let ports: Vec<String> = FALLBACK_PORTS.iter().map(|p| p.to_string()).collect();
        let selected = ports.first().cloned();
        Self { ports, selected }
    }

    /// Available ports, in backend order
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// Currently selected port
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Check whether a port is listed
    pub fn contains(&self, port: &str) -> bool {
        self.ports.iter().any(|p| p == port)
    }

    /// Select a listed port
    pub fn select(&mut self, port: &str) -> Result<(), ControlError> {
        if !self.contains(port) {
            return Err(ControlError::UnknownPort(port.to_string()));
        }
        self.selected = Some(port.to_string());
        Ok(())
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Replace every port and clear the selection
    pub fn replace(&mut self, ports: Vec<String>) {
        self.ports = ports;
        self.selected = None;
    }
}

impl Default for PortCatalog {
    fn default() -> Self {
        Self::with_fallback()
    }
}

/// Enumerates serial ports through the gateway
#[derive(Debug, Clone)]
pub struct PortDiscovery {
    gateway: CommandGateway,
    command_timeout: Option<Duration>,
    notices: Option<NoticeSink>,
}

impl PortDiscovery {
    /// Create a discovery adapter
    pub fn new(gateway: CommandGateway, settings: &ControllerConfig) -> Self {
        Self {
            gateway,
            command_timeout: settings.command_timeout,
            notices: None,
        }
    }

    /// Publish refresh results as notices
    pub fn with_notices(mut self, sink: NoticeSink) -> Self {
        self.notices = Some(sink);
        self
    }

    /// Ask the backend for the current port list
    pub async fn discover(&self) -> Result<Vec<String>, GatewayError> {
        let command = commands::READ_SERIAL_PORT;
        let value = self
            .gateway
            .invoke_within(command, CommandArgs::new(), self.command_timeout)
            .await?;

        serde_json::from_value(value).map_err(|e| GatewayError::MalformedReply {
            command: command.to_string(),
            reason: e.to_string(),
        })
    }

    /// Refresh `catalog` from the backend
    ///
    /// On success the catalog holds exactly the reported ports and nothing is
    /// selected. On failure the catalog is untouched.
    pub async fn refresh<'c>(
        &self,
        catalog: &'c mut PortCatalog,
    ) -> Result<&'c [String], GatewayError> {
        match self.discover().await {
            Ok(ports) => {
                info!("Found {} serial port(s)", ports.len());
                notice::send(&self.notices, Notice::PortsRefreshed { count: ports.len() });
                catalog.replace(ports);
                Ok(catalog.ports())
            }
            Err(err) => {
                warn!("Failed to enumerate ports: {}", err);
                notice::send(
                    &self.notices,
                    Notice::DiscoveryFailed {
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }
}
