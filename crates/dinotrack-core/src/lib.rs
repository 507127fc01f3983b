//! Observation, reconciliation, and tick scheduling for the Dinotrack live
//! census.
//!
//! This crate turns what a game server reports into an authoritative
//! roster and species census. Two observation models feed the same
//! [`Reconciler`]:
//!
//! - **Snapshot** -- poll the full player list and per-player detail, then
//!   diff against the roster.
//! - **Event tail** -- read lines appended to the server log and apply join
//!   and leave events in log order.
//!
//! A deployment runs one of them, chosen by [`config::TrackerMode`].
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `dinotrack-config.yaml` into
//!   strongly-typed structs.
//! - [`source`] -- [`ObservationSource`] trait, observation types, and the
//!   transport collaborator traits.
//! - [`snapshot`] -- The full-roster poll source.
//! - [`tail`] -- The log-tail source.
//! - [`parse`] -- Server log line parsing.
//! - [`reconciler`] -- The roster state machine.
//! - [`view`] -- The immutable view published after each tick.
//! - [`scheduler`] -- Fixed-interval source and status loops.
//! - [`notify`] -- Change notification text and sinks.
//! - [`status`] -- The category-grouped status board.
//!
//! [`Reconciler`]: reconciler::Reconciler
//! [`ObservationSource`]: source::ObservationSource

pub mod config;
pub mod notify;
pub mod parse;
pub mod reconciler;
pub mod scheduler;
pub mod snapshot;
pub mod source;
pub mod status;
pub mod tail;
pub mod view;
