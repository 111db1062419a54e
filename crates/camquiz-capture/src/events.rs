//! Capture event bus — typed events from the pipeline to display surfaces.
//!
//! The EventBus is a `tokio::sync::broadcast` channel carrying
//! [`CaptureEvent`] values. Each display surface (terminal, panel, log
//! file) subscribes independently. With no subscribers, events are dropped.

use camquiz::QuizDocument;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::CapturedRecord;

/// Every event the capture pipeline emits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaptureEvent {
    /// A request passed the filter and is being fetched.
    RequestMatched { url: String },
    /// A request was collapsed into an in-flight or recent capture.
    RequestDeduplicated { url: String },
    /// A payload was fetched, stored and extracted.
    XmlCaptured {
        key: String,
        record: CapturedRecord,
        document: QuizDocument,
    },
    /// Fetching or storing failed; nothing was recorded.
    CaptureFailed { url: String, error: String },
}

impl CaptureEvent {
    /// URL of the resource the event is about.
    pub fn url(&self) -> &str {
        match self {
            CaptureEvent::RequestMatched { url }
            | CaptureEvent::RequestDeduplicated { url }
            | CaptureEvent::CaptureFailed { url, .. } => url,
            CaptureEvent::XmlCaptured { record, .. } => &record.source_url,
        }
    }
}

/// Broadcast bus for capture events.
pub struct EventBus {
    sender: broadcast::Sender<CaptureEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: CaptureEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
