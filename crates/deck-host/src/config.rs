//! Host backend configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the simulated host backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Interval between scale readings while the serial bridge runs
    #[serde(with = "millis")]
    pub reading_interval: Duration,
    /// Artificial latency before each command is answered
    #[serde(with = "millis", default)]
    pub response_delay: Duration,
    /// Ports whose names contain any of these are not listed
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Listed ports that fail to open, as if held by another program
    #[serde(default)]
    pub busy_ports: Vec<String>,
    /// TCP ports the websocket server cannot bind
    #[serde(default)]
    pub reserved_ws_ports: Vec<u16>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            reading_interval: Duration::from_millis(500),
            response_delay: Duration::ZERO,
            skip_patterns: vec![
                // Bluetooth ports on macOS
                "Bluetooth".to_string(),
                // Debug/logging ports
                "debug".to_string(),
            ],
            busy_ports: Vec::new(),
            reserved_ws_ports: Vec::new(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
