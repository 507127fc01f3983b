//! Full-roster poll source.
//!
//! Each tick fetches the complete player list, then queries detail for each
//! listed player in turn. A failed list query aborts the tick. A failed or
//! empty detail query only marks that player as unknown for this tick; the
//! reconciler keeps whatever it last knew about them.

use tracing::{debug, warn};

use crate::source::{
    DetailLookup, Observation, ObservationSource, ObservedPlayer, PlayerQuery, RosterSnapshot,
    SourceError,
};

/// Polls a [`PlayerQuery`] for complete roster snapshots.
#[derive(Debug)]
pub struct SnapshotSource<Q> {
    query: Q,
}

impl<Q: PlayerQuery> SnapshotSource<Q> {
    /// Create a source over the given query collaborator.
    pub const fn new(query: Q) -> Self {
        Self { query }
    }

    /// Release the query collaborator.
    pub fn into_inner(self) -> Q {
        self.query
    }
}

impl<Q: PlayerQuery> ObservationSource for SnapshotSource<Q> {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn observe(&mut self) -> Result<Observation, SourceError> {
        let listings = self
            .query
            .fetch_player_list()
            .await
            .map_err(|source| SourceError::Transport {
                operation: "fetch player list",
                source,
            })?;

        let mut players = Vec::with_capacity(listings.len());
        for listing in listings {
            let detail = match self.query.fetch_player_detail(&listing.display_name).await {
                Ok(DetailLookup::Found(detail)) => Some(detail),
                Ok(DetailLookup::NotFound) => {
                    debug!(
                        player_id = %listing.player_id,
                        display_name = %listing.display_name,
                        "No detail returned for listed player"
                    );
                    None
                }
                Err(error) => {
                    warn!(
                        player_id = %listing.player_id,
                        display_name = %listing.display_name,
                        error = %error,
                        "Detail query failed"
                    );
                    None
                }
            };
            players.push(ObservedPlayer { listing, detail });
        }

        Ok(Observation::Snapshot(RosterSnapshot { players }))
    }
}
