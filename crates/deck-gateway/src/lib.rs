//! Host Backend Contracts
//!
//! This crate defines the two narrow channels between the service control
//! layer and the host backend that actually runs the services:
//!
//! - **Command gateway**: async request/response. A command name and a flat
//!   map of arguments go in, a JSON value or a normalized failure reason
//!   comes out.
//! - **Event channel**: topic subscriptions delivering an unbounded stream of
//!   payloads pushed by the backend until the subscriber detaches.
//!
//! Backends plug in through the [`Transport`] trait. The gateway is stateless
//! and cheap to clone, so every controller holds its own handle.
//!
//! # Example
//!
//! ```rust,ignore
//! use deck_gateway::{commands, CommandArgs, CommandGateway};
//!
//! let gateway = CommandGateway::new(transport);
//! let args = CommandArgs::new().with("port", 9898u16);
//! let outcome = gateway.run(commands::START_WS_SERVER, args, None).await?;
//! assert!(outcome.success);
//! ```

pub mod args;
pub mod error;
pub mod events;
pub mod gateway;
pub mod names;
pub mod outcome;

pub use args::{ArgValue, CommandArgs};
pub use error::{normalize_reason, GatewayError, UNKNOWN_ERROR};
pub use events::{EventBus, EventEnvelope, EventSource, Subscription};
pub use gateway::{CommandGateway, Transport};
pub use names::{commands, topics, ServiceId};
pub use outcome::{is_truthy, CommandOutcome};
