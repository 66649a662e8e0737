//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ConsoleEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the pipeline: the
//! orchestration facade publishes, UI/log sinks subscribe.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// What kind of console event this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleEventKind {
    /// Captured stdout/stderr text from a script run.
    Log,
    /// A terminal failure message.
    Error,
}

/// One console event emitted by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEvent {
    /// Log line or failure message.
    pub kind: ConsoleEventKind,
    /// The event text.
    pub text: String,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ConsoleEvent {
    /// Create a new event stamped with the current time.
    pub fn new(kind: ConsoleEventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published event. Publishing with zero
/// subscribers is not an error.
pub struct EventBus {
    sender: broadcast::Sender<ConsoleEvent>,
}

impl EventBus {
    /// Create a bus with an explicit channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: ConsoleEvent) {
        // A send error only means there are no subscribers right now.
        if self.sender.send(event).is_err() {
            tracing::trace!("console event dropped: no subscribers");
        }
    }

    /// Publish a [`ConsoleEventKind::Log`] event.
    pub fn log(&self, text: impl Into<String>) {
        self.publish(ConsoleEvent::new(ConsoleEventKind::Log, text));
    }

    /// Publish a [`ConsoleEventKind::Error`] event.
    pub fn error(&self, text: impl Into<String>) {
        self.publish(ConsoleEvent::new(ConsoleEventKind::Error, text));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
