//! Sinks that bridge the scheduler to the outside world.
//!
//! [`ObserverSink`] logs each change notification and broadcasts it to
//! connected `WebSocket` clients. [`LogStatusSink`] writes the status board
//! to the log on every refresh.

use std::sync::Arc;

use dinotrack_core::notify::{ChangeSink, NotifyError};
use dinotrack_core::scheduler::StatusSink;
use dinotrack_core::status::StatusBoard;
use dinotrack_observer::state::{AppState, ChangeBroadcast};
use dinotrack_types::ChangeRecord;
use tracing::{debug, info};

/// Change sink backed by the Observer API state.
#[derive(Debug)]
pub struct ObserverSink {
    state: Option<Arc<AppState>>,
}

impl ObserverSink {
    /// Create a sink. With no state, changes are only logged.
    pub const fn new(state: Option<Arc<AppState>>) -> Self {
        Self { state }
    }
}

impl ChangeSink for ObserverSink {
    fn on_change(&mut self, change: &ChangeRecord) -> Result<(), NotifyError> {
        let message = ChangeBroadcast::from_change(change);
        info!(player_id = %change.player_id(), "{}", message.text);

        if let Some(state) = &self.state {
            let receivers = state.broadcast(&message);
            debug!(receivers, "Change broadcast sent");
        }
        Ok(())
    }
}

/// Status sink that logs the rendered board.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn on_status(&mut self, board: &StatusBoard) -> Result<(), NotifyError> {
        info!(
            tick = board.tick,
            total_players = board.total_players,
            "Status board\n{}",
            board.render_text()
        );
        Ok(())
    }
}
