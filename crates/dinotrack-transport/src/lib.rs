//! Concrete transports for the Dinotrack observation sources.
//!
//! - [`rcon`] -- Evrima RCON client implementing
//!   [`PlayerQuery`](dinotrack_core::source::PlayerQuery) for the snapshot
//!   source.
//! - [`response`] -- Parsers for the RCON player-list and player-data
//!   replies.
//! - [`logfile`] -- Local server log reader implementing
//!   [`LogReader`](dinotrack_core::source::LogReader) for the event-tail
//!   source.
//!
//! Remote log transfer is not handled here. Deployments mount or sync the
//! server log to a local path.

pub mod logfile;
pub mod rcon;
pub mod response;

pub use logfile::FileLogReader;
pub use rcon::RconClient;
pub use response::PlayerDataParser;
