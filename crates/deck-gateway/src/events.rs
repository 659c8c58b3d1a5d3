//! Push-subscription channel for backend telemetry
//!
//! Subscriptions are unbounded: the backend never waits on a slow
//! subscriber, and a subscriber only ever falls behind in memory. Dropping a
//! [`Subscription`] detaches it; the bus prunes it on the next publish.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

use crate::names::ServiceId;

/// One payload pushed by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Topic the payload was published on
    pub topic: String,
    /// Service that produced the payload, when the backend says so
    pub source: Option<ServiceId>,
    /// Payload text
    pub payload: String,
}

impl EventEnvelope {
    /// Create an envelope tagged with its producing service
    pub fn from_service(topic: &str, source: ServiceId, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.to_string(),
            source: Some(source),
            payload: payload.into(),
        }
    }

    /// Create an envelope with no producer tag
    pub fn untagged(topic: &str, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.to_string(),
            source: None,
            payload: payload.into(),
        }
    }
}

/// Anything that can hand out topic subscriptions
pub trait EventSource: Send + Sync {
    /// Subscribe to a topic
    fn subscribe(&self, topic: &str) -> Subscription;
}

/// A live subscription to one topic
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    rx: mpsc::UnboundedReceiver<EventEnvelope>,
}

impl Subscription {
    /// Wrap a receiver fed by an [`EventSource`] implementation
    pub fn new(topic: impl Into<String>, rx: mpsc::UnboundedReceiver<EventEnvelope>) -> Self {
        Self {
            topic: topic.into(),
            rx,
        }
    }

    /// Topic this subscription listens on
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next payload
    ///
    /// Returns `None` only once the source has gone away.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        self.rx.recv().await
    }

    /// Take a payload if one is already queued
    pub fn try_next(&mut self) -> Option<EventEnvelope> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving; payloads already queued are discarded
    pub fn detach(mut self) {
        self.rx.close();
        debug!("Detached from {}", self.topic);
    }
}

type Subscribers = HashMap<String, Vec<mpsc::UnboundedSender<EventEnvelope>>>;

/// In-process event bus fanning payloads out to topic subscribers
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver an envelope to every live subscriber of its topic
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(&envelope.topic) else {
            return 0;
        };

        senders.retain(|tx| tx.send(envelope.clone()).is_ok());
        let reached = senders.len();
        if senders.is_empty() {
            subscribers.remove(&envelope.topic);
        }
        reached
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock()
            .get(topic)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, topic: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.lock();
        let senders = subscribers.entry(topic.to_string()).or_default();
        senders.retain(|tx| !tx.is_closed());
        senders.push(tx);
        debug!("Subscribed to {}", topic);
        Subscription::new(topic, rx)
    }
}
