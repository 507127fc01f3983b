//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for change notifications, the
//! view the scheduler publishes after every tick, and the species catalog
//! the status board is grouped by.

use std::sync::Arc;

use dinotrack_census::KnownSpeciesCatalog;
use dinotrack_core::notify::render_change;
use dinotrack_core::view::SharedView;
use dinotrack_types::ChangeRecord;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for change notifications.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// JSON message pushed over the `WebSocket` for every change.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChangeBroadcast {
    /// The chat notification line.
    pub text: String,
    /// The structured change.
    pub change: ChangeRecord,
}

impl ChangeBroadcast {
    /// Render a change into its broadcast form.
    pub fn from_change(change: &ChangeRecord) -> Self {
        Self {
            text: render_change(change),
            change: change.clone(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for change notifications.
    pub tx: broadcast::Sender<ChangeBroadcast>,
    /// The most recently published census view.
    pub view: SharedView,
    /// Catalog used to group the status board.
    pub catalog: Arc<KnownSpeciesCatalog>,
}

impl AppState {
    /// Create application state over a published view.
    pub fn new(view: SharedView, catalog: Arc<KnownSpeciesCatalog>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx, view, catalog }
    }

    /// Subscribe to the change broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a change to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, message: &ChangeBroadcast) -> usize {
        self.tx.send(message.clone()).unwrap_or(0)
    }
}
