/*!
 * Lifecycle Events
 * Typed batch/transfer notifications over a broadcast channel
 */

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::core::limits::EVENT_CHANNEL_CAPACITY;

/// Events emitted while a mount batch is fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoaderEvent {
    /// First transfer of a batch was scheduled
    BatchBegin,

    FileBegin { url: String },

    /// `bytes_total` is `None` when the source does not announce a length
    FileProgress {
        url: String,
        bytes_loaded: u64,
        bytes_total: Option<u64>,
    },

    /// Transfer settled (successfully or not)
    FileComplete { url: String },

    /// Transfer or materialization failed; always followed by `FileComplete`
    FileError { url: String, reason: String },

    /// Last outstanding transfer settled
    BatchComplete,
}

impl LoaderEvent {
    /// Locator the event refers to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            LoaderEvent::FileBegin { url }
            | LoaderEvent::FileProgress { url, .. }
            | LoaderEvent::FileComplete { url }
            | LoaderEvent::FileError { url, .. } => Some(url),
            LoaderEvent::BatchBegin | LoaderEvent::BatchComplete => None,
        }
    }
}

/// Event broadcaster
/// Uses tokio broadcast channel; emitting never blocks the pipeline
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<LoaderEvent>>,
}

impl EventBus {
    /// Create new bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.sender.subscribe()
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: LoaderEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
