//! Request/response channel to the host backend

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::args::CommandArgs;
use crate::error::GatewayError;
use crate::outcome::CommandOutcome;

/// Raw link to a host backend
///
/// Implementations deliver a command and wait for the reply. A rejection
/// carries the backend's own reason, which may be a plain string or a
/// structured value; the gateway normalizes it. No deadline is applied here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a command and wait for the reply
    async fn call(&self, command: &str, args: CommandArgs) -> Result<Value, Value>;
}

/// Stateless command gateway shared by every controller
#[derive(Clone)]
pub struct CommandGateway {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for CommandGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGateway")
            .field("transport", &"<transport>")
            .finish()
    }
}

impl CommandGateway {
    /// Create a gateway over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Invoke a command and wait for its raw reply
    ///
    /// Suspends until the backend answers. A backend that never answers
    /// leaves the caller suspended; use [`invoke_within`](Self::invoke_within)
    /// to bound the wait.
    pub async fn invoke(&self, command: &str, args: CommandArgs) -> Result<Value, GatewayError> {
        debug!("Invoking {} with {} argument(s)", command, args.len());
        match self.transport.call(command, args).await {
            Ok(value) => {
                debug!("{} replied {}", command, value);
                Ok(value)
            }
            Err(reason) => {
                let err = GatewayError::from_reason(&reason);
                debug!("{} rejected: {}", command, err);
                Err(err)
            }
        }
    }

    /// Invoke a command, giving up after `deadline`
    ///
    /// With `None` this is the same as [`invoke`](Self::invoke). On expiry a
    /// [`GatewayError::TimedOut`] is synthesized; the backend request itself
    /// is not recalled.
    pub async fn invoke_within(
        &self,
        command: &str,
        args: CommandArgs,
        deadline: Option<Duration>,
    ) -> Result<Value, GatewayError> {
        let Some(limit) = deadline else {
            return self.invoke(command, args).await;
        };

        match tokio::time::timeout(limit, self.invoke(command, args)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} got no reply within {:?}", command, limit);
                Err(GatewayError::TimedOut {
                    command: command.to_string(),
                    after: limit,
                })
            }
        }
    }

    /// Invoke a lifecycle command and interpret its reply as an outcome
    pub async fn run(
        &self,
        command: &str,
        args: CommandArgs,
        deadline: Option<Duration>,
    ) -> Result<CommandOutcome, GatewayError> {
        self.invoke_within(command, args, deadline)
            .await
            .map(CommandOutcome::from_value)
    }
}
