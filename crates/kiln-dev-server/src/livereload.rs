use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages pushed to connected browsers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LiveReloadMessage {
    /// Connected confirmation
    Connected,

    /// Stylesheets changed; swap them without reloading the page
    CssUpdate { paths: Vec<String> },

    /// Full page reload required
    FullReload { reason: String },

    /// A build step failed
    Error { title: String, message: String },
}

/// Broadcast hub between the build tasks and the browser connections
pub struct LiveReload {
    tx: broadcast::Sender<LiveReloadMessage>,
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    /// Send a message to every connected client; a no-op when nobody listens
    pub fn broadcast(&self, message: LiveReloadMessage) {
        let receivers = self.tx.send(message).unwrap_or(0);
        tracing::trace!("Live reload message sent to {} client(s)", receivers);
    }

    pub fn css_update(&self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        tracing::debug!("Injecting {} stylesheet(s)", paths.len());
        self.broadcast(LiveReloadMessage::CssUpdate { paths });
    }

    pub fn full_reload(&self, reason: impl Into<String>) {
        self.broadcast(LiveReloadMessage::FullReload {
            reason: reason.into(),
        });
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) {
        self.broadcast(LiveReloadMessage::Error {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveReloadMessage> {
        self.tx.subscribe()
    }

    /// Get number of connected clients
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}
