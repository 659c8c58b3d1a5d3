//! Telemetry merging
//!
//! A [`TelemetryMerger`] keeps the latest payload from one event topic.
//! Payloads overwrite each other as they arrive; nothing is buffered and the
//! controller's status is never consulted. When scoped to a service, payloads
//! tagged by a different service are ignored.

use std::sync::Arc;

use deck_gateway::{topics, EventEnvelope, EventSource, ServiceId};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

/// Reading shown before the first payload arrives
pub const DEFAULT_READING: &str = "0.000";

/// Folds a topic's payloads into a single latest value
#[derive(Debug)]
pub struct TelemetryMerger {
    topic: &'static str,
    scope: Option<ServiceId>,
    value: Arc<watch::Sender<String>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TelemetryMerger {
    /// Merger accepting every payload on `topic`
    pub fn new(topic: &'static str) -> Self {
        let (value, _) = watch::channel(DEFAULT_READING.to_string());
        Self {
            topic,
            scope: None,
            value: Arc::new(value),
            shutdown: None,
        }
    }

    /// Merger that ignores payloads tagged by services other than `service`
    pub fn scoped(topic: &'static str, service: ServiceId) -> Self {
        let mut merger = Self::new(topic);
        merger.scope = Some(service);
        merger
    }

    /// Merger for the serial bridge's readings
    pub fn serial() -> Self {
        Self::scoped(topics::SERIAL_DATA, ServiceId::SERIAL)
    }

    /// Topic this merger listens on
    pub fn topic(&self) -> &'static str {
        self.topic
    }

    /// Latest value
    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    /// Observe value changes
    pub fn watch(&self) -> watch::Receiver<String> {
        self.value.subscribe()
    }

    /// True while a subscription is live
    pub fn is_attached(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Fold one envelope into the value
    ///
    /// Returns false if the envelope belongs to another topic or service.
    pub fn apply(&self, envelope: &EventEnvelope) -> bool {
        fold(&self.value, self.topic, self.scope, envelope)
    }

    /// Subscribe to the topic and fold payloads in a background task
    ///
    /// Must be called from within a Tokio runtime. Returns false if already
    /// attached.
    pub fn attach(&mut self, source: &dyn EventSource) -> bool {
        if self.is_attached() {
            return false;
        }

        let mut subscription = source.subscribe(self.topic);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let value = Arc::clone(&self.value);
        let topic = self.topic;
        let scope = self.scope;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    next = subscription.next() => {
                        let Some(envelope) = next else { break; };
                        fold(&value, topic, scope, &envelope);
                    }
                }
            }
            subscription.detach();
        });

        self.shutdown = Some(shutdown_tx);
        info!("Telemetry attached to {}", self.topic);
        true
    }

    /// Drop the subscription; the last value is kept
    pub fn detach(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
            info!("Telemetry detached from {}", self.topic);
        }
    }
}

impl Drop for TelemetryMerger {
    fn drop(&mut self) {
        self.detach();
    }
}

fn fold(
    value: &watch::Sender<String>,
    topic: &str,
    scope: Option<ServiceId>,
    envelope: &EventEnvelope,
) -> bool {
    if envelope.topic != topic {
        return false;
    }
    if let (Some(want), Some(got)) = (scope, envelope.source) {
        if want != got {
            debug!("Ignoring {} payload from {}", topic, got);
            return false;
        }
    }
    value.send_replace(envelope.payload.clone());
    true
}
