//! Observation sources and the transport collaborators they sit on.
//!
//! Each tick the scheduler asks one [`ObservationSource`] what reality
//! looks like. The two variants observe through different transports:
//!
//! - [`SnapshotSource`](crate::snapshot::SnapshotSource) polls a
//!   [`PlayerQuery`] for the full player list plus per-player detail.
//! - [`EventTailSource`](crate::tail::EventTailSource) reads appended bytes
//!   from a [`LogReader`] and parses them into log events.
//!
//! Sources only observe. They never touch the roster; the
//! [`Reconciler`](crate::reconciler::Reconciler) applies what they return.

use std::future::Future;

use dinotrack_types::{PlayerDetail, PlayerListing};

use crate::parse::{LogEvent, ParseMismatch};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A transport collaborator could not answer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Address that was dialled.
        address: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading or writing an established connection or file failed.
    #[error("transport I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The remote side rejected the credentials.
    #[error("authentication rejected: {message}")]
    Auth {
        /// What the remote side answered.
        message: String,
    },

    /// The remote side answered with something unusable.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },
}

/// A tick could not produce an observation.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A transport call failed; the tick is aborted.
    #[error("{operation} failed: {source}")]
    Transport {
        /// Which transport call failed.
        operation: &'static str,
        /// The underlying transport error.
        source: TransportError,
    },
}

// ---------------------------------------------------------------------------
// Transport collaborators
// ---------------------------------------------------------------------------

/// Answer to a per-player detail query.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailLookup {
    /// The server described the player.
    Found(PlayerDetail),
    /// The server had nothing for that name.
    NotFound,
}

/// Query interface for the full-roster poll.
pub trait PlayerQuery: Send {
    /// Fetch the current player list.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on connection or protocol failure.
    fn fetch_player_list(
        &mut self,
    ) -> impl Future<Output = Result<Vec<PlayerListing>, TransportError>> + Send;

    /// Fetch detail for one player by display name.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on connection or protocol failure.
    fn fetch_player_detail(
        &mut self,
        display_name: &str,
    ) -> impl Future<Output = Result<DetailLookup, TransportError>> + Send;
}

/// Bytes appended to the log since a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogChunk {
    /// Raw appended bytes.
    pub bytes: Vec<u8>,
    /// Offset of the first byte. Equals the requested cursor unless the
    /// log was rewound.
    pub start: u64,
    /// Offset just past the last byte.
    pub end: u64,
    /// The log was shorter than the cursor (truncated or rotated) and was
    /// read from the beginning.
    pub rewound: bool,
    /// The read stopped at the reader's size limit with more bytes
    /// remaining past `end`.
    pub capped: bool,
}

/// Read interface for the tailed log.
pub trait LogReader: Send {
    /// Current length of the log, used as the first-tick baseline.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the log cannot be inspected.
    fn end_offset(&mut self) -> impl Future<Output = Result<u64, TransportError>> + Send;

    /// Read everything appended at or after `cursor`.
    ///
    /// Calling again with the same cursor returns the same bytes plus
    /// anything appended since.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the log cannot be read.
    fn read_appended(
        &mut self,
        cursor: u64,
    ) -> impl Future<Output = Result<LogChunk, TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One listed player plus the detail fetched for it this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedPlayer {
    /// Identity from the player list.
    pub listing: PlayerListing,
    /// Detail, or `None` when the detail query failed or found nothing.
    pub detail: Option<PlayerDetail>,
}

/// A complete point-in-time enumeration of active players.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterSnapshot {
    /// Every listed player, in list order.
    pub players: Vec<ObservedPlayer>,
}

/// Events parsed from one read of the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBatch {
    /// Parsed events in log order.
    pub events: Vec<LogEvent>,
    /// Join-data lines that matched no known shape.
    pub mismatches: Vec<ParseMismatch>,
    /// The log was rewound before this read.
    pub rewound: bool,
}

/// What a source saw on one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A full roster enumeration, reconciled by diffing.
    Snapshot(RosterSnapshot),
    /// Discrete events, reconciled by applying them in order.
    Events(EventBatch),
}

/// A producer of observations, ticked by the scheduler.
pub trait ObservationSource: Send {
    /// Short name used in logs and tick reports.
    fn name(&self) -> &'static str;

    /// Observe reality once.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the observation could not be made. The
    /// tick is then aborted with state untouched.
    fn observe(&mut self) -> impl Future<Output = Result<Observation, SourceError>> + Send;
}
