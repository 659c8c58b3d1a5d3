//! Simulated serial bridge
//!
//! Stands in for a scale attached to a serial port. While running, the
//! bridge publishes one reading per tick on `serial_data`, tagged with the
//! serial service id.

use std::time::Duration;

use deck_gateway::{topics, EventBus, EventEnvelope, ServiceId};
use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Deterministic scale readings drifting around a base weight
#[derive(Debug, Clone)]
pub struct ScaleSimulator {
    base: f64,
    amplitude: f64,
    tick: u64,
}

impl ScaleSimulator {
    /// Readings around `base` with a swing of `amplitude`
    pub fn new(base: f64, amplitude: f64) -> Self {
        Self {
            base,
            amplitude,
            tick: 0,
        }
    }

    /// Next reading formatted with three decimals
    pub fn next_reading(&mut self) -> String {
        let phase = self.tick as f64 * 0.3;
        self.tick = self.tick.wrapping_add(1);
        let weight = (self.base + self.amplitude * phase.sin()).max(0.0);
        format!("{:.3}", weight)
    }
}

impl Default for ScaleSimulator {
    fn default() -> Self {
        Self::new(12.5, 0.25)
    }
}

/// A running serial bridge
#[derive(Debug)]
pub struct SerialBridge {
    port_name: String,
    baud_rate: u32,
    shutdown: Option<oneshot::Sender<()>>,
}

impl SerialBridge {
    /// Start publishing readings on `bus`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        port_name: &str,
        baud_rate: u32,
        bus: EventBus,
        reading_interval: Duration,
        mut scale: ScaleSimulator,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let port = port_name.to_string();

        tokio::spawn(async move {
            let mut ticker = interval(reading_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let reading = scale.next_reading();
                        let reached = bus.publish(EventEnvelope::from_service(
                            topics::SERIAL_DATA,
                            ServiceId::SERIAL,
                            reading.as_str(),
                        ));
                        debug!("{} read {} ({} subscriber(s))", port, reading, reached);
                    }
                }
            }

            info!("Serial bridge on {} shutting down", port);
        });

        info!("Serial bridge listening on {} at {} baud", port_name, baud_rate);
        Self {
            port_name: port_name.to_string(),
            baud_rate,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Port the bridge is attached to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Baud rate the port was opened with
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Stop publishing
    pub fn stop(mut self) {
        self.shutdown_now();
    }

    fn shutdown_now(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for SerialBridge {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}
