//! Axum router construction for the Observer API.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- HTML status board
/// - `GET /ws/changes` -- `WebSocket` change notification stream
/// - `GET /api/census` -- status board JSON
/// - `GET /api/roster` -- active sessions
/// - `GET /api/roster/{id}` -- single session
/// - `GET /api/health` -- liveness
///
/// Every route is read-only, so CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/changes", get(ws::ws_changes))
        .route("/api/census", get(handlers::get_census))
        .route("/api/roster", get(handlers::list_roster))
        .route("/api/roster/{id}", get(handlers::get_player))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
