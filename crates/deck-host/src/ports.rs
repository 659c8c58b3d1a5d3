//! Serial port sources
//!
//! The backend answers `read_serial_port` from a [`PortSource`].

use serialport::available_ports;
use tracing::info;

use crate::error::HostError;

/// Something that can list serial port names
pub trait PortSource: Send + Sync {
    /// List port names in a stable order
    fn list(&self) -> Result<Vec<String>, HostError>;
}

/// The machine's real serial ports
#[derive(Debug, Clone, Default)]
pub struct SystemPorts {
    skip_patterns: Vec<String>,
}

impl SystemPorts {
    /// List real ports, skipping names that contain any of `skip_patterns`
    pub fn new(skip_patterns: Vec<String>) -> Self {
        Self { skip_patterns }
    }

    /// Check if a port should be skipped
    fn should_skip_port(&self, port: &str) -> bool {
        self.skip_patterns
            .iter()
            .any(|pattern| port.contains(pattern.as_str()))
    }
}

impl PortSource for SystemPorts {
    fn list(&self) -> Result<Vec<String>, HostError> {
        info!("Enumerating serial ports...");
        let ports =
            available_ports().map_err(|e| HostError::EnumerationFailed(e.to_string()))?;

        let result: Vec<String> = ports
            .into_iter()
            .map(|p| p.port_name)
            .filter(|name| !self.should_skip_port(name))
            .collect();

        if result.is_empty() {
            info!("No serial ports found");
        } else {
            info!("Found {} serial port(s)", result.len());
        }
        Ok(result)
    }
}

/// A fixed list of port names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedPorts(Vec<String>);

impl FixedPorts {
    /// Serve these names, in this order
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ports.into_iter().map(Into::into).collect())
    }
}

impl PortSource for FixedPorts {
    fn list(&self) -> Result<Vec<String>, HostError> {
        Ok(self.0.clone())
    }
}
