//! Lifecycle state tracking

use std::fmt;

use crate::error::ControlError;

/// Running status of a managed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceStatus {
    /// Not running; the only state a start may begin from
    #[default]
    Stopped,
    /// Start command in flight
    Starting,
    /// Running; the only state a stop may begin from
    Running,
    /// Stop command in flight
    Stopping,
}

impl ServiceStatus {
    /// True while a start or stop command is in flight
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }

    /// Whether the state machine allows moving to `to`
    pub fn can_transition(&self, to: ServiceStatus) -> bool {
        use ServiceStatus::*;
        matches!(
            (*self, to),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Stopped)
                | (Running, Stopping)
                | (Stopping, Stopped)
                | (Stopping, Running)
        )
    }

    /// Check a transition, naming it in the error if it is not allowed
    pub fn check_transition(&self, to: ServiceStatus) -> Result<(), ControlError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(ControlError::InvalidTransition { from: *self, to })
        }
    }

    /// Human-readable connection label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "Disconnected",
            Self::Starting => "Connecting",
            Self::Running => "Connected",
            Self::Stopping => "Disconnecting",
        }
    }

    /// Label for the single start/stop button
    pub fn action_label(&self) -> &'static str {
        match self {
            Self::Stopped | Self::Starting => "Start",
            Self::Running | Self::Stopping => "Stop",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Snapshot of one service's lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    /// Current status
    pub status: ServiceStatus,
    /// Last failure, cleared by the next successful transition
    pub last_error: Option<String>,
}

impl LifecycleState {
    /// True while a transition is in flight (the view disables its trigger)
    pub fn is_busy(&self) -> bool {
        self.status.is_transitional()
    }

    /// True once the service is running
    pub fn is_running(&self) -> bool {
        self.status == ServiceStatus::Running
    }
}

/// What happened to a start or stop request
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The command succeeded; the service settled in this status
    Completed(ServiceStatus),
    /// The command failed; the previous stable status was restored and the
    /// message recorded as the last error
    Failed(String),
    /// The request was refused before any command was issued
    Rejected(ControlError),
}

impl TransitionOutcome {
    /// True if the transition completed
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
