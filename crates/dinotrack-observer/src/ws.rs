//! `WebSocket` stream of change notifications.
//!
//! Clients connect to `GET /ws/changes` and receive one JSON text frame
//! per [`ChangeBroadcast`] in application order. Every client holds its own
//! receiver on the shared broadcast channel. A client that falls behind
//! loses the lagged changes and carries on from the newest one.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, ChangeBroadcast};

/// `GET /ws/changes`
pub async fn ws_changes(
    upgrade: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    upgrade.on_upgrade(|socket| stream_changes(socket, state))
}

async fn stream_changes(mut socket: WebSocket, state: Arc<AppState>) {
    let mut changes = state.subscribe();
    debug!("Change stream client attached");

    loop {
        let flow = tokio::select! {
            received = changes.recv() => match received {
                Ok(change) => push(&mut socket, &change).await,
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Change stream client lagged");
                    ControlFlow::Continue(())
                }
                Err(RecvError::Closed) => ControlFlow::Break("broadcast closed"),
            },
            frame = socket.recv() => reply(&mut socket, frame).await,
        };

        if let ControlFlow::Break(reason) = flow {
            debug!(reason, "Change stream client detached");
            return;
        }
    }
}

/// Send one change as a JSON text frame.
async fn push(socket: &mut WebSocket, change: &ChangeBroadcast) -> ControlFlow<&'static str> {
    let json = match serde_json::to_string(change) {
        Ok(json) => json,
        Err(error) => {
            warn!(error = %error, "Change not serializable, skipped");
            return ControlFlow::Continue(());
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        return ControlFlow::Break("send failed");
    }
    ControlFlow::Continue(())
}

/// Handle one frame from the client. Only ping and close matter.
async fn reply(
    socket: &mut WebSocket,
    frame: Option<Result<Message, axum::Error>>,
) -> ControlFlow<&'static str> {
    match frame {
        None | Some(Ok(Message::Close(_))) => ControlFlow::Break("closed by client"),
        Some(Err(_)) => ControlFlow::Break("protocol error"),
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_err() {
                ControlFlow::Break("pong failed")
            } else {
                ControlFlow::Continue(())
            }
        }
        Some(Ok(_)) => ControlFlow::Continue(()),
    }
}
