//! Monitor event broadcast for UI shells.
//!
//! The in-app toast channel: a shell subscribes once and receives every
//! classification, notification and sink failure of the stream.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use airsense_types::{ClassificationResult, DataSource, NotificationDecision};

use crate::message::AlertPayload;

/// Which sink failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Reading persistence.
    Reading,
    /// Outbound push alert.
    Alert,
}

/// Events emitted by an [`crate::AirQualityMonitor`].
///
/// All events are serializable for logging, persistence, and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum MonitorEvent {
    /// A reading was classified.
    Classified {
        source: DataSource,
        result: ClassificationResult,
        decision: NotificationDecision,
    },
    /// A category change passed the notification gate.
    Notification { alert: AlertPayload },
    /// The stream switched provider and its history was cleared.
    SourceChanged { from: DataSource, to: DataSource },
    /// The stream was reset on request.
    Reset,
    /// A sink call failed.
    SinkFailed { sink: SinkKind, error: String },
}

/// Sender for monitor events.
pub type EventSender = broadcast::Sender<MonitorEvent>;

/// Receiver for monitor events.
pub type EventReceiver = broadcast::Receiver<MonitorEvent>;

/// Default broadcast buffer.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: MonitorEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
