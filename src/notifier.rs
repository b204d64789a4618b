//! In-process fan-out hub backed by a `tokio::sync::broadcast` channel.
//!
//! Subscribers connecting after a publish never see it; there is no replay
//! or backlog. A slow subscriber lags and drops messages without ever
//! blocking the publisher, so ingestion cannot be held up by a stuck
//! client.

use crate::models::reading::ReadingUpdate;
use serde::Serialize;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// One message pushed to live subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "channel", content = "payload", rename_all = "camelCase")]
pub enum Notification {
    Alert { message: String },
    ReadingUpdate(ReadingUpdate),
}

/// Shared via `Arc<Notifier>`; any number of subscribers each receive every
/// notification published after they subscribed, in publish order.
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Best-effort: with zero subscribers the message is dropped.
    pub fn publish_alert(&self, message: String) {
        let _ = self.sender.send(Notification::Alert { message });
    }

    pub fn publish_reading(&self, update: ReadingUpdate) {
        let _ = self.sender.send(Notification::ReadingUpdate(update));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
