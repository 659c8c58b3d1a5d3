//! One-shot user notifications

use std::fmt;

use deck_gateway::ServiceId;
use tokio::sync::mpsc;

/// Sender side of the notice channel
pub type NoticeSink = mpsc::UnboundedSender<Notice>;

/// A notification the view shows once and forgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A service started
    Started(ServiceId),
    /// A service stopped
    Stopped(ServiceId),
    /// A start or stop attempt failed
    TransitionFailed {
        /// Service that failed
        service: ServiceId,
        /// "start" or "stop"
        action: &'static str,
        /// Normalized failure text
        message: String,
    },
    /// The port catalog was refreshed
    PortsRefreshed {
        /// Number of ports found
        count: usize,
    },
    /// Port discovery failed
    DiscoveryFailed {
        /// Normalized failure text
        message: String,
    },
}

impl Notice {
    /// True for failure notices
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::TransitionFailed { .. } | Notice::DiscoveryFailed { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Started(service) => write!(f, "{} started", service),
            Notice::Stopped(service) => write!(f, "{} stopped", service),
            Notice::TransitionFailed {
                service,
                action,
                message,
            } => write!(f, "failed to {} {}: {}", action, service, message),
            Notice::PortsRefreshed { count } => write!(f, "found {} port(s)", count),
            Notice::DiscoveryFailed { message } => {
                write!(f, "failed to list ports: {}", message)
            }
        }
    }
}

pub(crate) fn send(sink: &Option<NoticeSink>, notice: Notice) {
    if let Some(tx) = sink {
        let _ = tx.send(notice);
    }
}
