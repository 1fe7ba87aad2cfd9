//! Live reload signalling between the watcher and browser clients.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// Cloneable handle that tells every connected browser to reload.
///
/// Each live-reload websocket subscribes to the handle; the watcher calls
/// [`Reloader::reload`] after a pipeline run.
#[derive(Debug, Clone)]
pub struct Reloader {
    tx: broadcast::Sender<()>,
}

impl Default for Reloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reloader {
    /// Create a handle with no connected clients.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Signal all connected clients. Returns how many were notified.
    pub fn reload(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Receive future reload signals.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Number of currently subscribed clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
