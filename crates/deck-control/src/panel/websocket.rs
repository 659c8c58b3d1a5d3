//! Websocket server panel

use deck_gateway::CommandGateway;
use tokio::sync::watch;
use tracing::info;

use super::ensure_editable;
use crate::config::{ControllerConfig, ServiceConfig, WebsocketParams};
use crate::controller::LifecycleController;
use crate::error::ControlError;
use crate::notice::NoticeSink;
use crate::state::{LifecycleState, ServiceStatus, TransitionOutcome};

/// Listen port offered on mount
pub const DEFAULT_WS_PORT: u16 = 9898;

/// Host the websocket server binds to
pub const LISTEN_HOST: &str = "127.0.0.1";

/// Panel for the websocket server
pub struct WebsocketPanel {
    controller: LifecycleController<WebsocketParams>,
    port: u16,
}

impl WebsocketPanel {
    /// Mount the panel: service stopped, default port
    pub fn mount(gateway: CommandGateway, settings: &ControllerConfig) -> Self {
        Self {
            controller: LifecycleController::new(ServiceConfig::websocket(), gateway, settings),
            port: DEFAULT_WS_PORT,
        }
    }

    /// Publish lifecycle results as notices
    pub fn with_notices(mut self, sink: NoticeSink) -> Self {
        self.controller = self.controller.with_notices(sink);
        self
    }

    /// The panel's lifecycle controller
    pub fn controller(&self) -> &LifecycleController<WebsocketParams> {
        &self.controller
    }

    /// Snapshot of the lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.controller.current_state()
    }

    /// Observe lifecycle changes
    pub fn watch_state(&self) -> watch::Receiver<LifecycleState> {
        self.controller.subscribe()
    }

    /// Configured listen port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Change the listen port
    pub fn set_port(&mut self, port: u16) -> Result<(), ControlError> {
        ensure_editable(self.controller.service_id(), self.controller.status())?;
        self.port = port;
        Ok(())
    }

    /// Start the server on the configured port
    pub async fn start(&mut self) -> TransitionOutcome {
        let params = WebsocketParams { port: self.port };
        self.controller.start(&params).await
    }

    /// Stop the server
    pub async fn stop(&mut self) -> TransitionOutcome {
        self.controller.stop().await
    }

    /// The single start/stop button
    pub async fn toggle(&mut self) -> TransitionOutcome {
        if self.controller.status() == ServiceStatus::Running {
            self.stop().await
        } else {
            self.start().await
        }
    }

    /// Address clients connect to, shown only while running
    pub fn address(&self) -> Option<String> {
        (self.controller.status() == ServiceStatus::Running)
            .then(|| format!("ws://{}:{}", LISTEN_HOST, self.port))
    }

    /// Tear the panel down
    pub fn unmount(self) {
        info!("Websocket panel unmounted while {}", self.controller.status());
    }
}
