//! Simulated Host Backend
//!
//! This crate plays the host side of the control contract without touching
//! hardware. [`HostBackend`] answers the five lifecycle and discovery
//! commands through the [`Transport`](deck_gateway::Transport) trait and
//! publishes scale readings on the `serial_data` topic while the serial
//! bridge runs.
//!
//! Port enumeration is pluggable: [`SystemPorts`] lists the machine's real
//! serial ports, [`FixedPorts`] serves a static list for tests and demos.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use deck_gateway::CommandGateway;
//! use deck_host::{FixedPorts, HostBackend, HostConfig};
//!
//! let backend = Arc::new(HostBackend::new(
//!     HostConfig::default(),
//!     Box::new(FixedPorts::new(["COM1", "COM3"])),
//! ));
//! let gateway = CommandGateway::new(backend.clone());
//! let events = backend.events();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod ports;
pub mod serial;
pub mod websocket;

pub use backend::HostBackend;
pub use config::HostConfig;
pub use error::HostError;
pub use ports::{FixedPorts, PortSource, SystemPorts};
pub use serial::{ScaleSimulator, SerialBridge};
pub use websocket::WsServer;
