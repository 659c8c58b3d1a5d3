//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use deck_control::{ControllerConfig, DEFAULT_BAUD_RATE, DEFAULT_WS_PORT};
use deck_host::HostConfig;
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Serial port to open, if not the first one listed
    #[serde(default)]
    pub serial_port: Option<String>,
    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Websocket listen port
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
    /// Deadline for each host command in milliseconds; 0 waits forever
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// List the machine's real serial ports
    #[serde(default)]
    pub use_system_ports: bool,
    /// Ports the simulated host offers
    #[serde(default = "default_simulated_ports")]
    pub simulated_ports: Vec<String>,
    /// Simulated host behavior
    #[serde(default)]
    pub host: HostConfig,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_ws_port() -> u16 {
    DEFAULT_WS_PORT
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_simulated_ports() -> Vec<String> {
    vec!["COM1".to_string(), "COM2".to_string(), "COM3".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            serial_port: None,
            baud_rate: default_baud_rate(),
            ws_port: default_ws_port(),
            command_timeout_ms: default_command_timeout_ms(),
            use_system_ports: false,
            simulated_ports: default_simulated_ports(),
            host: HostConfig::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for portdeck
    /// Uses $XDG_CONFIG_HOME/portdeck on Linux/macOS, falls back to ~/.config/portdeck
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("portdeck"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("portdeck"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine settings path"))?;
        self.save_to(&path)
    }

    /// Save settings to a file as pretty JSON
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create settings directory: {}", e)
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Failed to write settings: {}", e))?;
        Ok(())
    }

    /// Controller settings derived from these
    pub fn controller_config(&self) -> ControllerConfig {
        match self.command_timeout_ms {
            0 => ControllerConfig::unbounded(),
            ms => ControllerConfig::with_timeout(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("portdeck-test-{}-{}", std::process::id(), name))
            .join("settings.json")
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.ws_port, 9898);
        assert_eq!(
            settings.controller_config().command_timeout,
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let settings = Settings {
            command_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(settings.controller_config(), ControllerConfig::unbounded());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ws_port": 8080}"#).unwrap();
        assert_eq!(settings.ws_port, 8080);
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.simulated_ports, vec!["COM1", "COM2", "COM3"]);
    }

    #[test]
    fn test_save_and_load() {
        let path = scratch_path("roundtrip");
        let settings = Settings {
            serial_port: Some("COM2".to_string()),
            baud_rate: 19200,
            ..Default::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let path = scratch_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(Settings::load_from(&path), Settings::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    proptest! {
        #[test]
        fn settings_survive_json(
            serial_port in proptest::option::of("[A-Za-z0-9/._-]{1,16}"),
            baud_rate in 1u32..=4_000_000,
            ws_port in 1u16..,
            command_timeout_ms in 0u64..120_000,
            use_system_ports in any::<bool>(),
            simulated_ports in prop::collection::vec("COM[0-9]{1,2}", 0..6),
        ) {
            let settings = Settings {
                serial_port,
                baud_rate,
                ws_port,
                command_timeout_ms,
                use_system_ports,
                simulated_ports,
                ..Default::default()
            };
            let json = serde_json::to_string_pretty(&settings).unwrap();
            let back: Settings = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, settings);
        }
    }
}
