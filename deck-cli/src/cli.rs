//! Command-line arguments

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "portdeck", version, about = "Serial bridge and websocket server control")]
pub struct Cli {
    /// List the machine's real serial ports instead of the simulated list
    #[arg(long, global = true)]
    pub system_ports: bool,
    /// Deadline for each host command in milliseconds (0 waits forever)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh and print the port list
    Ports,
    /// Start both services, stream readings, then stop them
    Run(RunArgs),
    /// Print the effective settings
    Config {
        /// Write them to the settings file first
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Serial port to open
    #[arg(long)]
    pub port: Option<String>,
    /// Serial baud rate
    #[arg(long)]
    pub baud: Option<u32>,
    /// Websocket listen port
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub ws_port: Option<u16>,
    /// How long to stream readings
    #[arg(long, default_value_t = 5)]
    pub seconds: u64,
}

impl Cli {
    /// Override settings with global flags
    pub fn apply(&self, settings: &mut Settings) {
        if self.system_ports {
            settings.use_system_ports = true;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.command_timeout_ms = timeout_ms;
        }
    }
}

impl RunArgs {
    /// Override settings with `run` flags
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(port) = &self.port {
            settings.serial_port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            settings.baud_rate = baud;
        }
        if let Some(ws_port) = self.ws_port {
            settings.ws_port = ws_port;
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}
