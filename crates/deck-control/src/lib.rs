//! Service Lifecycle Control Layer
//!
//! This crate is the control surface for services that run inside a host
//! backend (a serial-port bridge and a websocket server). It never performs
//! serial or socket I/O itself: it issues commands through a
//! [`CommandGateway`](deck_gateway::CommandGateway) and folds telemetry
//! pushed through an [`EventSource`](deck_gateway::EventSource).
//!
//! # Architecture
//!
//! - [`LifecycleController`] is one state machine, parameterized by a
//!   [`ServiceConfig`] that names the start/stop commands and builds the
//!   start arguments. Both services use it.
//! - [`PortDiscovery`] enumerates serial ports into a [`PortCatalog`].
//! - [`TelemetryMerger`] keeps the latest reading from a topic.
//! - [`SerialPanel`] and [`WebsocketPanel`] are headless panel models that
//!   own one controller each and expose what a view renders.
//!
//! ```text
//! Stopped --start--> Starting --ok--> Running
//!    ^                  |               |
//!    +------fail--------+             stop
//!    |                                  v
//!    +--------------ok------------- Stopping --fail--> Running
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use deck_control::{ControllerConfig, WebsocketPanel};
//!
//! let mut panel = WebsocketPanel::mount(gateway, &ControllerConfig::default());
//! panel.start().await;
//! println!("{:?}", panel.address());
//! ```

pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod notice;
pub mod panel;
pub mod state;
pub mod telemetry;

pub use config::{ControllerConfig, SerialParams, ServiceConfig, WebsocketParams};
pub use controller::LifecycleController;
pub use discovery::{PortCatalog, PortDiscovery, FALLBACK_PORTS};
pub use error::ControlError;
pub use notice::{Notice, NoticeSink};
pub use panel::{SerialPanel, WebsocketPanel, DEFAULT_BAUD_RATE, DEFAULT_WS_PORT, LISTEN_HOST};
pub use state::{LifecycleState, ServiceStatus, TransitionOutcome};
pub use telemetry::{TelemetryMerger, DEFAULT_READING};
