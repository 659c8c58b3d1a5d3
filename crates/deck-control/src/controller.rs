//! Service Lifecycle Controller
//!
//! One state machine drives every managed service. The per-service
//! differences (command names, start arguments) live in [`ServiceConfig`].
//!
//! The controller publishes its [`LifecycleState`] through a
//! [`tokio::sync::watch`] channel. Beginning a transition is a single
//! check-and-set on that channel, so a second start or stop issued while one
//! is in flight is refused without touching the gateway, even when the
//! controller is shared between tasks.

use std::time::Duration;

use deck_gateway::{CommandArgs, CommandGateway, CommandOutcome, GatewayError, ServiceId};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{ControllerConfig, ServiceConfig};
use crate::error::ControlError;
use crate::notice::{self, Notice, NoticeSink};
use crate::state::{LifecycleState, ServiceStatus, TransitionOutcome};

/// Which way a transition goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
}

impl Action {
    /// Stable status the transition begins from (and reverts to on failure)
    fn origin(self) -> ServiceStatus {
        match self {
            Action::Start => ServiceStatus::Stopped,
            Action::Stop => ServiceStatus::Running,
        }
    }

    fn pending(self) -> ServiceStatus {
        match self {
            Action::Start => ServiceStatus::Starting,
            Action::Stop => ServiceStatus::Stopping,
        }
    }

    fn target(self) -> ServiceStatus {
        match self {
            Action::Start => ServiceStatus::Running,
            Action::Stop => ServiceStatus::Stopped,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }

    /// Message for a reply that arrived but was falsy
    fn generic_failure(self) -> &'static str {
        match self {
            Action::Start => "failed to start service",
            Action::Stop => "failed to stop service",
        }
    }
}

/// Lifecycle controller for one service
pub struct LifecycleController<P> {
    config: ServiceConfig<P>,
    gateway: CommandGateway,
    command_timeout: Option<Duration>,
    state: watch::Sender<LifecycleState>,
    notices: Option<NoticeSink>,
}

impl<P> LifecycleController<P> {
    /// Create a controller in the `Stopped` state
    pub fn new(config: ServiceConfig<P>, gateway: CommandGateway, settings: &ControllerConfig) -> Self {
        let (state, _) = watch::channel(LifecycleState::default());
        Self {
            config,
            gateway,
            command_timeout: settings.command_timeout,
            state,
            notices: None,
        }
    }

    /// Publish start/stop results as notices
    pub fn with_notices(mut self, sink: NoticeSink) -> Self {
        self.notices = Some(sink);
        self
    }

    /// Service this controller drives
    pub fn service_id(&self) -> ServiceId {
        self.config.service_id()
    }

    /// Configuration this controller was built with
    pub fn config(&self) -> &ServiceConfig<P> {
        &self.config
    }

    /// Snapshot of the current state
    pub fn current_state(&self) -> LifecycleState {
        self.state.borrow().clone()
    }

    /// Current status
    pub fn status(&self) -> ServiceStatus {
        self.state.borrow().status
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Start the service
    ///
    /// Only allowed from `Stopped`. The outcome is also reflected in the
    /// published state; callers that only render state may ignore it.
    pub async fn start(&self, params: &P) -> TransitionOutcome {
        let command = self.config.start_command();
        let pending = match self.begin(Action::Start, command) {
            Ok(pending) => pending,
            Err(rejection) => return TransitionOutcome::Rejected(rejection),
        };

        let args = self.config.start_args(params);
        info!("Starting {} service", self.service_id());
        let result = self.gateway.run(command, args, self.command_timeout).await;
        pending.disarm();
        self.settle(Action::Start, result)
    }

    /// Stop the service
    ///
    /// Only allowed from `Running`.
    pub async fn stop(&self) -> TransitionOutcome {
        let command = self.config.stop_command();
        let pending = match self.begin(Action::Stop, command) {
            Ok(pending) => pending,
            Err(rejection) => return TransitionOutcome::Rejected(rejection),
        };

        info!("Stopping {} service", self.service_id());
        let result = self
            .gateway
            .run(command, CommandArgs::new(), self.command_timeout)
            .await;
        pending.disarm();
        self.settle(Action::Stop, result)
    }

    /// Atomically move from the action's origin to its pending status
    ///
    /// The returned guard reverts to the origin if the transition is
    /// abandoned before [`settle`](Self::settle) runs.
    fn begin(
        &self,
        action: Action,
        command: &'static str,
    ) -> Result<PendingTransition<'_>, ControlError> {
        let mut observed = action.origin();
        let began = self.state.send_if_modified(|state| {
            observed = state.status;
            if state.status == action.origin() {
                state.status = action.pending();
                true
            } else {
                false
            }
        });

        if began {
            return Ok(PendingTransition {
                state: &self.state,
                service: self.service_id(),
                action,
                command,
                armed: true,
            });
        }

        let service = self.service_id();
        let rejection = match (action, observed) {
            (_, status) if status.is_transitional() => ControlError::Busy { service, status },
            (Action::Start, _) => ControlError::AlreadyRunning(service),
            (Action::Stop, _) => ControlError::NotRunning(service),
        };
        debug!("Refused to {} {}: {}", action.verb(), service, rejection);
        Err(rejection)
    }

    /// Apply the command result to the state
    fn settle(
        &self,
        action: Action,
        result: Result<CommandOutcome, GatewayError>,
    ) -> TransitionOutcome {
        let failure = match result {
            Ok(outcome) if outcome.success => None,
            Ok(outcome) => Some(outcome.failure_message(action.generic_failure())),
            Err(err) => Some(err.to_string()),
        };

        let next = match failure {
            None => action.target(),
            Some(_) => action.origin(),
        };

        let mut invalid = None;
        self.state.send_modify(|state| {
            if let Err(err) = state.status.check_transition(next) {
                invalid = Some(err);
                return;
            }
            state.status = next;
            state.last_error = failure.clone();
        });

        let service = self.service_id();
        if let Some(err) = invalid {
            error!("{} state machine violated: {}", service, err);
            return TransitionOutcome::Rejected(err);
        }

        match failure {
            None => {
                info!("{} service is {}", service, next);
                let done = match action {
                    Action::Start => Notice::Started(service),
                    Action::Stop => Notice::Stopped(service),
                };
                notice::send(&self.notices, done);
                TransitionOutcome::Completed(next)
            }
            Some(message) => {
                warn!("Failed to {} {} service: {}", action.verb(), service, message);
                notice::send(
                    &self.notices,
                    Notice::TransitionFailed {
                        service,
                        action: action.verb(),
                        message: message.clone(),
                    },
                );
                TransitionOutcome::Failed(message)
            }
        }
    }
}

/// A transition between `begin` and `settle`
///
/// Dropped while armed (the caller gave up on the future), it restores the
/// origin status and records the command as cancelled.
struct PendingTransition<'a> {
    state: &'a watch::Sender<LifecycleState>,
    service: ServiceId,
    action: Action,
    command: &'static str,
    armed: bool,
}

impl PendingTransition<'_> {
    /// The command reply arrived; `settle` takes over
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingTransition<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let pending = self.action.pending();
        let origin = self.action.origin();
        let message = format!("{} cancelled", self.command);
        let reverted = self.state.send_if_modified(|state| {
            if state.status != pending {
                return false;
            }
            state.status = origin;
            state.last_error = Some(message.clone());
            true
        });

        if reverted {
            warn!(
                "Abandoned {} of {} service, back to {}",
                self.action.verb(),
                self.service,
                origin
            );
        }
    }
}

impl<P> std::fmt::Debug for LifecycleController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("service", &self.service_id())
            .field("state", &*self.state.borrow())
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}
