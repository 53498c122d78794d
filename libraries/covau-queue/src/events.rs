//! Queue events
//!
//! Events are broadcast to any number of subscribers (UI, CLI, tests):
//! - Notifications for recoverable problems (duplicate items, bad indices)
//! - Now-playing changes
//! - List changes

use covau_core::SharedItem;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    Info,
    Warning,
}

/// Events emitted by a queue
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// Message meant for the user
    Notify { level: NotifyLevel, message: String },
    /// The player started `item`
    NowPlaying(SharedItem),
    /// Items or cursor changed
    Changed,
}

/// Sending half of the queue event channel
#[derive(Debug, Clone)]
pub struct QueueEvents {
    tx: broadcast::Sender<QueueEvent>,
}

impl Default for QueueEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: QueueEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.emit(QueueEvent::Notify {
            level: NotifyLevel::Warning,
            message,
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.emit(QueueEvent::Notify {
            level: NotifyLevel::Info,
            message,
        });
    }
}
