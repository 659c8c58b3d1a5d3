//! Serial bridge panel

use std::sync::Arc;

use deck_gateway::{CommandGateway, EventSource};
use tokio::sync::watch;
use tracing::info;

use super::ensure_editable;
use crate::config::{ControllerConfig, SerialParams, ServiceConfig};
use crate::controller::LifecycleController;
use crate::discovery::{PortCatalog, PortDiscovery};
use crate::error::ControlError;
use crate::notice::NoticeSink;
use crate::state::{LifecycleState, ServiceStatus, TransitionOutcome};
use crate::telemetry::TelemetryMerger;

/// Baud rate offered on mount
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Panel for the serial bridge: port selection, baud rate, live reading
pub struct SerialPanel {
    controller: LifecycleController<SerialParams>,
    discovery: PortDiscovery,
    catalog: PortCatalog,
    baud_rate: u32,
    telemetry: TelemetryMerger,
    events: Arc<dyn EventSource>,
}

impl SerialPanel {
    /// Mount the panel: service stopped, fallback ports, default baud rate
    pub fn mount(
        gateway: CommandGateway,
        events: Arc<dyn EventSource>,
        settings: &ControllerConfig,
    ) -> Self {
        Self {
            controller: LifecycleController::new(
                ServiceConfig::serial(),
                gateway.clone(),
                settings,
            ),
            discovery: PortDiscovery::new(gateway, settings),
            catalog: PortCatalog::with_fallback(),
            baud_rate: DEFAULT_BAUD_RATE,
            telemetry: TelemetryMerger::serial(),
            events,
        }
    }

    /// Publish lifecycle and discovery results as notices
    pub fn with_notices(mut self, sink: NoticeSink) -> Self {
        self.controller = self.controller.with_notices(sink.clone());
        self.discovery = self.discovery.with_notices(sink);
        self
    }

    /// The panel's lifecycle controller
    pub fn controller(&self) -> &LifecycleController<SerialParams> {
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

    /// Ports offered for selection
    pub fn ports(&self) -> &[String] {
        self.catalog.ports()
    }

    /// Selected port
    pub fn selected_port(&self) -> Option<&str> {
        self.catalog.selected()
    }

    /// Re-read the port list; clears the selection on success
    pub async fn refresh_ports(&mut self) -> Result<&[String], ControlError> {
        Ok(self.discovery.refresh(&mut self.catalog).await?)
    }

    /// Select a listed port
    pub fn select_port(&mut self, port: &str) -> Result<(), ControlError> {
        ensure_editable(self.controller.service_id(), self.controller.status())?;
        self.catalog.select(port)
    }

    /// Configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Change the baud rate
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), ControlError> {
        ensure_editable(self.controller.service_id(), self.controller.status())?;
        self.baud_rate = baud_rate;
        Ok(())
    }

    /// Start the bridge on the selected port
    ///
    /// Telemetry is attached once the service is running.
    pub async fn start(&mut self) -> TransitionOutcome {
        let Some(port) = self.catalog.selected() else {
            return TransitionOutcome::Rejected(ControlError::NoPortSelected);
        };
        let params = SerialParams {
            port_name: port.to_string(),
            baud_rate: self.baud_rate,
        };

        let outcome = self.controller.start(&params).await;
        if self.controller.status() == ServiceStatus::Running {
            self.telemetry.attach(self.events.as_ref());
        }
        outcome
    }

    /// Stop the bridge; the last reading stays on display
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

    /// Latest reading
    pub fn reading(&self) -> String {
        self.telemetry.value()
    }

    /// Observe reading changes
    pub fn watch_reading(&self) -> watch::Receiver<String> {
        self.telemetry.watch()
    }

    /// True while the reading subscription is live
    pub fn is_receiving(&self) -> bool {
        self.telemetry.is_attached()
    }

    /// Tear the panel down, detaching telemetry
    pub fn unmount(mut self) {
        self.telemetry.detach();
        info!("Serial panel unmounted while {}", self.controller.status());
    }
}
