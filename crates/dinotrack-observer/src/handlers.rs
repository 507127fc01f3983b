//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read the published [`CensusView`] through the shared
//! [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | HTML status board |
//! | `GET` | `/api/census` | Status board as JSON |
//! | `GET` | `/api/roster` | All active sessions |
//! | `GET` | `/api/roster/{id}` | One active session |
//! | `GET` | `/api/health` | Liveness and last tick |
//!
//! [`CensusView`]: dinotrack_core::view::CensusView

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use dinotrack_core::status::{StatusBoard, STATUS_TITLE};
use dinotrack_types::PlayerId;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- HTML status board
// ---------------------------------------------------------------------------

/// Serve the status board as a small HTML page.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let board = {
        let view = state.view.read().await;
        StatusBoard::build(&view, &state.catalog)
    };

    let mut sections = String::new();
    for section in &board.sections {
        let _ = write!(sections, "    <h2>{}</h2>\n    <ul>\n", section.heading);
        if section.entries.is_empty() {
            sections.push_str("        <li class=\"none\">none</li>\n");
        }
        for entry in &section.entries {
            let _ = writeln!(
                sections,
                "        <li>{}: <span class=\"count\">{}</span></li>",
                escape_html(&entry.species),
                entry.count
            );
        }
        sections.push_str("    </ul>\n");
    }

    let total = board.total_players;
    let updated = board.updated_at.format("%Y-%m-%d %H:%M:%S UTC");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta http-equiv="refresh" content="30">
    <title>{STATUS_TITLE}</title>
    <style>
        body {{
            background: #14120f;
            color: #e6dccb;
            font-family: 'JetBrains Mono', 'DejaVu Sans Mono', monospace;
            padding: 2rem;
            max-width: 640px;
            margin: 0 auto;
        }}
        h1 {{ color: #e0a45a; margin: 0 0 0.5rem; }}
        h2 {{ color: #9cc46b; font-size: 1.1rem; margin-bottom: 0.25rem; }}
        ul {{ list-style: none; padding-left: 1rem; margin-top: 0; }}
        li {{ padding: 0.15rem 0; }}
        .count {{ color: #e0a45a; font-weight: bold; }}
        .none {{ color: #8a8173; }}
        .footer {{ color: #8a8173; font-size: 0.85rem; }}
        hr {{ border: 0; border-top: 1px dashed #3b352c; margin: 1.25rem 0; }}
    </style>
</head>
<body>
    <h1>{STATUS_TITLE}</h1>
    <p>Total Players: <span class="count">{total}</span></p>
{sections}
    <hr>
    <p class="footer">Last updated: {updated}</p>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/census -- status board
// ---------------------------------------------------------------------------

/// Return the category-grouped status board.
pub async fn get_census(State(state): State<Arc<AppState>>) -> Json<StatusBoard> {
    let view = state.view.read().await;
    Json(StatusBoard::build(&view, &state.catalog))
}

// ---------------------------------------------------------------------------
// GET /api/roster -- active sessions
// ---------------------------------------------------------------------------

/// List every active session in player-id order.
pub async fn list_roster(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.view.read().await;
    let players = serde_json::to_value(view.roster.values().collect::<Vec<_>>())?;

    Ok(Json(serde_json::json!({
        "tick": view.tick,
        "count": view.total_players(),
        "players": players,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/roster/{id} -- one session
// ---------------------------------------------------------------------------

/// Return the session for one player, or 404 when the player is not
/// currently tracked.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let player_id = PlayerId::new(&id);
    let view = state.view.read().await;

    let session = view
        .roster
        .get(&player_id)
        .ok_or_else(|| ObserverError::NotFound(format!("player {player_id}")))?;

    Ok(Json(serde_json::to_value(session)?))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Report liveness and the last published tick.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.view.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "tick": view.tick,
        "total_players": view.total_players(),
        "updated_at": view.updated_at,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escape text for inclusion in HTML element content.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
