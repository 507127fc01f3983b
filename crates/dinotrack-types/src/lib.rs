//! Shared type definitions for the Dinotrack live census.
//!
//! This crate is the single source of truth for the data model shared by
//! the census store, the reconciler, the transport collaborators, and the
//! observer API.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe player identifier
//! - [`enums`] -- Species category and creature gender
//! - [`structs`] -- Player sessions and the raw observations they are built from
//! - [`change`] -- Change records emitted per reconciliation tick

pub mod change;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use change::ChangeRecord;
pub use enums::{Category, Gender};
pub use ids::PlayerId;
pub use structs::{PlayerDetail, PlayerListing, PlayerSession, Vitals};
