//! Observer API server for the Dinotrack live census.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Status board** (`GET /`) rendered as HTML, grouped by category
//! - **REST endpoints** for the census board, the roster, single players,
//!   and a health probe
//! - **`WebSocket` endpoint** (`/ws/changes`) streaming every change
//!   notification via [`tokio::sync::broadcast`]
//!
//! # Architecture
//!
//! Handlers read the [`CensusView`] the scheduler publishes after each
//! tick. They never touch the reconciler, so a slow client cannot stall a
//! tick and a reader never sees half of one.
//!
//! [`CensusView`]: dinotrack_core::view::CensusView

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{spawn_observer, ServerConfig, ServerError};
pub use state::{AppState, ChangeBroadcast};
