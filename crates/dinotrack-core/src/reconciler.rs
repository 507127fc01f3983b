//! The reconciliation state machine.
//!
//! The [`Reconciler`] owns the [`Population`] and is the only thing that
//! mutates it. It accepts either observation model:
//!
//! 1. **Snapshot** -- diff the full player list against the roster. Players
//!    missing from the list leave; listed players with detail join, change
//!    species, or have their progress refreshed. Listed players without
//!    detail are unknown this tick and keep their last known state.
//!
//! 2. **Events** -- apply parsed log events strictly in log order. Events
//!    at offsets already applied are skipped, so handing the same byte
//!    range over twice changes nothing.
//!
//! Every tick ends with the consistency law re-checked. Drift is logged
//! and the census is rebuilt from the roster, which is authoritative.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use dinotrack_census::{
    CensusDrift, ConsistencyFault, NameNormalizer, Population, ZeroCountPolicy,
};
use dinotrack_types::{ChangeRecord, PlayerId, PlayerListing, PlayerSession};
use tracing::{debug, error, info, warn};

use crate::config::TrackerConfig;
use crate::parse::{LogEvent, LogEventKind, ParseMismatch};
use crate::source::{EventBatch, Observation, ObservedPlayer, RosterSnapshot};
use crate::view::CensusView;

/// Growth values closer than this are treated as equal.
const GROWTH_EPSILON: f32 = 1e-4;

/// Construction-time reconciliation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcilerSettings {
    /// What happens to species entries that reach zero.
    pub zero_counts: ZeroCountPolicy,
    /// Growth value that marks a fresh spawn.
    pub fresh_spawn_growth: f32,
    /// Consecutive detail failures before a warning. Zero disables it.
    pub detail_failure_warn_ticks: u32,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            zero_counts: ZeroCountPolicy::Retain,
            fresh_spawn_growth: 0.25,
            detail_failure_warn_ticks: 5,
        }
    }
}

impl From<&TrackerConfig> for ReconcilerSettings {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            zero_counts: config.zero_count_policy(),
            fresh_spawn_growth: config.fresh_spawn_growth,
            detail_failure_warn_ticks: config.detail_failure_warn_ticks,
        }
    }
}

/// Everything one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Which observation model was applied.
    pub source: &'static str,
    /// Roster changes in application order.
    pub changes: Vec<ChangeRecord>,
    /// Census underflows contained during the tick.
    pub faults: Vec<ConsistencyFault>,
    /// Join-data lines that matched no known shape.
    pub mismatches: Vec<ParseMismatch>,
    /// Events skipped because their offset was already applied.
    pub replayed: u32,
    /// Leave events for players that were not tracked.
    pub unknown_leaves: u32,
    /// Listed players whose detail was unavailable.
    pub unknown_details: u32,
    /// Census drift found by the end-of-tick check, already repaired.
    pub drift: Option<CensusDrift>,
}

/// Owner of the roster and census.
#[derive(Debug)]
pub struct Reconciler {
    population: Population,
    normalizer: NameNormalizer,
    settings: ReconcilerSettings,
    tick: u64,
    applied_through: u64,
    detail_misses: BTreeMap<PlayerId, u32>,
}

impl Reconciler {
    /// Create a reconciler with an empty roster.
    pub const fn new(normalizer: NameNormalizer, settings: ReconcilerSettings) -> Self {
        Self {
            population: Population::new(settings.zero_counts),
            normalizer,
            settings,
            tick: 0,
            applied_through: 0,
            detail_misses: BTreeMap::new(),
        }
    }

    /// The roster and census.
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Number of ticks applied so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Settings fixed at construction.
    pub const fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// Copy the current state into an immutable view.
    pub fn view(&self) -> CensusView {
        CensusView {
            tick: self.tick,
            roster: self.population.roster().clone(),
            census: self.population.census().clone(),
            updated_at: Utc::now(),
        }
    }

    /// Apply one observation as one tick.
    pub fn apply(&mut self, observation: Observation) -> TickReport {
        match observation {
            Observation::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            Observation::Events(batch) => self.apply_events(batch),
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot reconciliation
    // -----------------------------------------------------------------------

    /// Diff a full roster snapshot against the current roster.
    pub fn apply_snapshot(&mut self, snapshot: RosterSnapshot) -> TickReport {
        let mut report = self.begin("snapshot");

        let current: BTreeSet<&PlayerId> = snapshot
            .players
            .iter()
            .map(|player| &player.listing.player_id)
            .collect();
        let departed: Vec<PlayerId> = self
            .population
            .roster()
            .keys()
            .filter(|id| !current.contains(id))
            .cloned()
            .collect();
        self.detail_misses.retain(|id, _| current.contains(id));

        for player_id in departed {
            if let Some(session) = self.population.remove(&player_id) {
                report.changes.push(left(session));
            }
        }

        for ObservedPlayer { listing, detail } in snapshot.players {
            let Some(detail) = detail else {
                report.unknown_details = report.unknown_details.saturating_add(1);
                self.note_detail_miss(&listing);
                continue;
            };
            self.detail_misses.remove(&listing.player_id);

            let species = self.normalizer.normalize(&detail.species_raw);
            let session = PlayerSession {
                player_id: listing.player_id,
                display_name: listing.display_name,
                species: species.canonical,
                category: species.category,
                growth: detail.growth,
                gender: detail.gender,
                vitals: detail.vitals,
            };
            if let Some(change) = self.observe_session(session) {
                report.changes.push(change);
            }
        }

        self.finish(report)
    }

    fn note_detail_miss(&mut self, listing: &PlayerListing) {
        let streak = self
            .detail_misses
            .entry(listing.player_id.clone())
            .or_insert(0);
        *streak = streak.saturating_add(1);

        if *streak == self.settings.detail_failure_warn_ticks {
            warn!(
                player_id = %listing.player_id,
                display_name = %listing.display_name,
                ticks = *streak,
                "Player detail unavailable for consecutive ticks"
            );
        } else {
            debug!(
                player_id = %listing.player_id,
                ticks = *streak,
                "Player detail unavailable, keeping last known state"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Event reconciliation
    // -----------------------------------------------------------------------

    /// Apply a batch of log events in order.
    pub fn apply_events(&mut self, batch: EventBatch) -> TickReport {
        let mut report = self.begin("event_tail");

        if batch.rewound {
            info!(
                applied_through = self.applied_through,
                "Log rewound, resetting replay guard"
            );
            self.applied_through = 0;
        }
        report.mismatches = batch.mismatches;

        for event in batch.events {
            if event.offset < self.applied_through {
                report.replayed = report.replayed.saturating_add(1);
                continue;
            }
            self.applied_through = event.offset.saturating_add(1);
            self.apply_event(event, &mut report);
        }

        self.finish(report)
    }

    fn apply_event(&mut self, event: LogEvent, report: &mut TickReport) {
        match event.kind {
            LogEventKind::Join { .. } => {
                let species = self.normalizer.normalize(&event.species_raw);
                let session = PlayerSession {
                    player_id: event.player_id,
                    display_name: event.display_name,
                    species: species.canonical,
                    category: species.category,
                    growth: event.growth,
                    gender: event.gender,
                    vitals: None,
                };
                if let Some(change) = self.observe_session(session) {
                    report.changes.push(change);
                }
            }
            LogEventKind::Leave => match self.population.remove(&event.player_id) {
                Some(session) => report.changes.push(ChangeRecord::Left {
                    player_id: session.player_id,
                    display_name: event.display_name,
                    species: session.species,
                    growth: event.growth,
                }),
                None => {
                    debug!(
                        player_id = %event.player_id,
                        offset = event.offset,
                        "Leave for untracked player ignored"
                    );
                    report.unknown_leaves = report.unknown_leaves.saturating_add(1);
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // Shared mutation path
    // -----------------------------------------------------------------------

    /// Insert, move, or refresh one session and say what changed.
    fn observe_session(&mut self, session: PlayerSession) -> Option<ChangeRecord> {
        let change = match self.population.get(&session.player_id) {
            None => Some(ChangeRecord::Joined {
                player_id: session.player_id.clone(),
                display_name: session.display_name.clone(),
                species: session.species.clone(),
                fresh_spawn: self.is_fresh_spawn(session.growth),
                gender: session.gender,
                growth: session.growth,
            }),
            Some(existing) if existing.species != session.species => {
                Some(ChangeRecord::ChangedSpecies {
                    player_id: session.player_id.clone(),
                    display_name: session.display_name.clone(),
                    from: existing.species.clone(),
                    to: session.species.clone(),
                    gender: session.gender,
                    growth: session.growth,
                })
            }
            Some(existing) => {
                if session.growth < existing.growth - GROWTH_EPSILON {
                    debug!(
                        player_id = %session.player_id,
                        species = %session.species,
                        previous = existing.growth,
                        current = session.growth,
                        "Growth regressed without a species change"
                    );
                }
                None
            }
        };

        self.population.upsert(session);
        change
    }

    fn is_fresh_spawn(&self, growth: f32) -> bool {
        (growth - self.settings.fresh_spawn_growth).abs() <= GROWTH_EPSILON
    }

    fn begin(&mut self, source: &'static str) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        TickReport {
            tick: self.tick,
            source,
            ..TickReport::default()
        }
    }

    fn finish(&mut self, mut report: TickReport) -> TickReport {
        report.faults = self.population.take_faults();

        if let Some(drift) = self.population.verify_and_repair() {
            error!(
                tick = report.tick,
                source = report.source,
                imbalances = drift.imbalances.len(),
                detail = %drift.message,
                "Census drifted from roster, rebuilt from roster"
            );
            report.drift = Some(drift);
        }

        report
    }
}

fn left(session: PlayerSession) -> ChangeRecord {
    ChangeRecord::Left {
        player_id: session.player_id,
        display_name: session.display_name,
        species: session.species,
        growth: session.growth,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use dinotrack_census::KnownSpeciesCatalog;
    use dinotrack_types::{Category, Gender, PlayerDetail};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn reconciler(zero_counts: ZeroCountPolicy) -> Reconciler {
        Reconciler::new(
            NameNormalizer::new(Arc::new(KnownSpeciesCatalog::builtin())),
            ReconcilerSettings {
                zero_counts,
                ..ReconcilerSettings::default()
            },
        )
    }

    fn observed(id: &str, raw: Option<&str>, growth: f32) -> ObservedPlayer {
        ObservedPlayer {
            listing: PlayerListing {
                player_id: PlayerId::new(id),
                display_name: format!("player-{id}"),
            },
            detail: raw.map(|species_raw| PlayerDetail {
                species_raw: species_raw.to_owned(),
                growth,
                gender: None,
                vitals: None,
            }),
        }
    }

    fn snapshot(players: Vec<ObservedPlayer>) -> RosterSnapshot {
        RosterSnapshot { players }
    }

    fn join(offset: u64, id: &str, raw: &str, growth: f32) -> LogEvent {
        LogEvent {
            offset,
            kind: LogEventKind::Join { save_found: true },
            display_name: format!("player-{id}"),
            player_id: PlayerId::new(id),
            species_raw: raw.to_owned(),
            gender: Some(Gender::Female),
            growth,
        }
    }

    fn leave(offset: u64, id: &str, raw: &str) -> LogEvent {
        LogEvent {
            kind: LogEventKind::Leave,
            ..join(offset, id, raw, 0.5)
        }
    }

    fn batch(events: Vec<LogEvent>) -> EventBatch {
        EventBatch {
            events,
            ..EventBatch::default()
        }
    }

    // --- Snapshot ---

    #[test]
    fn settings_follow_tracker_mode() {
        let config = TrackerConfig {
            mode: crate::config::TrackerMode::EventTail,
            ..TrackerConfig::default()
        };
        let settings = ReconcilerSettings::from(&config);
        assert_eq!(settings.zero_counts, ZeroCountPolicy::Remove);
        assert_eq!(settings.detail_failure_warn_ticks, 5);
    }

    #[test]
    fn snapshot_join_then_omission_leaves() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        let report = r.apply_snapshot(snapshot(vec![observed("A", Some("Rex"), 0.8)]));
        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::Joined { species, fresh_spawn: false, .. }] if species == "Rex"
        ));

        let report = r.apply_snapshot(snapshot(Vec::new()));
        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::Left { player_id, species, .. }]
                if player_id.as_str() == "A" && species == "Rex"
        ));
        assert!(r.population().is_empty());
        assert_eq!(r.population().census().get("Rex"), 0);
        assert!(r.population().census().contains("Rex"));
    }

    #[test]
    fn snapshot_species_change_moves_count() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        r.apply_snapshot(snapshot(vec![observed("A", Some("BP_Stego_C"), 1.0)]));
        let report = r.apply_snapshot(snapshot(vec![observed("A", Some("BP_Carno_C"), 0.25)]));

        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::ChangedSpecies { from, to, .. }]
                if from == "Stegosaurus" && to == "Carnotaurus"
        ));
        assert_eq!(r.population().census().get("Stegosaurus"), 0);
        assert_eq!(r.population().census().get("Carnotaurus"), 1);
        let session = r.population().get(&PlayerId::new("A")).unwrap();
        assert_eq!(session.category, Category::Carnivore);
    }

    #[test]
    fn snapshot_progress_update_is_silent() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        r.apply_snapshot(snapshot(vec![observed("A", Some("BP_Stego_C"), 0.3)]));
        let report = r.apply_snapshot(snapshot(vec![observed("A", Some("BP_Stego_C"), 0.4)]));
        assert!(report.changes.is_empty());
        let growth = r.population().get(&PlayerId::new("A")).unwrap().growth;
        assert!((growth - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn snapshot_detail_failure_preserves_state() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        r.apply_snapshot(snapshot(vec![observed("A", Some("BP_Stego_C"), 0.3)]));
        for _ in 0..10 {
            let report = r.apply_snapshot(snapshot(vec![observed("A", None, 0.0)]));
            assert!(report.changes.is_empty());
            assert_eq!(report.unknown_details, 1);
        }
        assert!(r.population().contains(&PlayerId::new("A")));
        assert_eq!(r.population().census().get("Stegosaurus"), 1);
    }

    #[test]
    fn snapshot_unknown_new_player_is_not_added() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        let report = r.apply_snapshot(snapshot(vec![observed("B", None, 0.0)]));
        assert!(report.changes.is_empty());
        assert!(r.population().is_empty());
    }

    #[test]
    fn detail_miss_streak_resets_on_success_and_departure() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        r.apply_snapshot(snapshot(vec![observed("A", None, 0.0)]));
        r.apply_snapshot(snapshot(vec![observed("A", None, 0.0)]));
        assert_eq!(r.detail_misses.get(&PlayerId::new("A")), Some(&2));

        r.apply_snapshot(snapshot(vec![observed("A", Some("Rex"), 0.5)]));
        assert!(r.detail_misses.is_empty());

        r.apply_snapshot(snapshot(vec![observed("A", None, 0.0)]));
        r.apply_snapshot(snapshot(Vec::new()));
        assert!(r.detail_misses.is_empty());
    }

    #[test]
    fn fresh_spawn_follows_threshold() {
        let mut r = reconciler(ZeroCountPolicy::Retain);
        let report = r.apply_snapshot(snapshot(vec![observed("A", Some("Rex"), 0.25)]));
        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::Joined { fresh_spawn: true, .. }]
        ));
    }

    #[test]
    fn random_snapshot_sequences_keep_sum_equal_to_roster() {
        let species = ["BP_Carno_C", "BP_Stego_C", "Rex", "", "BP_Galli_C"];
        for zero_counts in [ZeroCountPolicy::Retain, ZeroCountPolicy::Remove] {
            let mut rng = StdRng::seed_from_u64(7);
            let mut r = reconciler(zero_counts);
            for _ in 0..300 {
                let mut players = Vec::new();
                for id in 0..10_u32 {
                    if rng.random_bool(0.6) {
                        let raw = rng
                            .random_bool(0.9)
                            .then(|| *species.get(rng.random_range(0..species.len())).unwrap());
                        players.push(observed(&id.to_string(), raw, 0.5));
                    }
                }
                let report = r.apply_snapshot(snapshot(players));
                assert!(report.faults.is_empty());
                assert!(report.drift.is_none());
                assert_eq!(
                    r.population().census().total(),
                    u64::try_from(r.population().len()).unwrap()
                );
            }
        }
    }

    // --- Events ---

    #[test]
    fn same_species_rejoin_only_updates_growth() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        let report = r.apply_events(batch(vec![
            join(0, "1", "BP_Stego_C", 0.25),
            join(120, "1", "BP_Stego_C", 0.40),
        ]));
        assert_eq!(report.changes.len(), 1);
        assert!(matches!(
            report.changes.first(),
            Some(ChangeRecord::Joined { fresh_spawn: true, .. })
        ));
        assert_eq!(r.population().census().get("Stegosaurus"), 1);
    }

    #[test]
    fn join_then_leave_in_one_batch_nets_out() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        r.apply_events(batch(vec![join(0, "9", "BP_Carno_C", 0.5)]));
        let before = r.population().census().clone();

        let report = r.apply_events(batch(vec![
            join(100, "1", "BP_Stego_C", 0.5),
            leave(200, "1", "BP_Stego_C"),
        ]));
        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::Joined { .. }, ChangeRecord::Left { .. }]
        ));
        assert!(!r.population().contains(&PlayerId::new("1")));
        assert_eq!(r.population().census(), &before);
    }

    #[test]
    fn replayed_batch_produces_no_changes() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        let events = vec![
            join(0, "1", "BP_Stego_C", 0.5),
            join(80, "2", "BP_Carno_C", 0.5),
            leave(160, "1", "BP_Stego_C"),
        ];
        let first = r.apply_events(batch(events.clone()));
        assert_eq!(first.changes.len(), 3);

        let second = r.apply_events(batch(events));
        assert!(second.changes.is_empty());
        assert_eq!(second.replayed, 3);
        assert_eq!(r.population().len(), 1);
    }

    #[test]
    fn rewound_batch_is_applied_again() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        r.apply_events(batch(vec![join(500, "1", "BP_Stego_C", 0.5)]));
        let report = r.apply_events(EventBatch {
            events: vec![leave(0, "1", "BP_Stego_C")],
            mismatches: Vec::new(),
            rewound: true,
        });
        assert_eq!(report.replayed, 0);
        assert!(r.population().is_empty());
    }

    #[test]
    fn leave_uses_stored_species() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        r.apply_events(batch(vec![join(0, "1", "BP_Stego_C", 0.5)]));
        let report = r.apply_events(batch(vec![leave(10, "1", "BP_Carno_C")]));
        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::Left { species, .. }] if species == "Stegosaurus"
        ));
        assert!(r.population().census().is_empty());
        assert!(report.faults.is_empty());
    }

    #[test]
    fn leave_reports_growth_at_departure() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        r.apply_events(batch(vec![join(0, "1", "BP_Stego_C", 0.25)]));
        let departure = LogEvent {
            display_name: String::from("Rexy"),
            growth: 0.60,
            ..leave(10, "1", "BP_Stego_C")
        };
        let report = r.apply_events(batch(vec![departure]));

        let [change] = report.changes.as_slice() else {
            panic!("expected one change, got {:?}", report.changes);
        };
        assert_eq!(
            crate::notify::render_change(change),
            "Rexy left (was Stegosaurus, 0.60 growth)"
        );
    }

    #[test]
    fn leave_for_unknown_player_is_ignored() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        let report = r.apply_events(batch(vec![leave(0, "ghost", "BP_Stego_C")]));
        assert!(report.changes.is_empty());
        assert_eq!(report.unknown_leaves, 1);
        assert!(report.faults.is_empty());
    }

    #[test]
    fn species_change_via_join_event() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        r.apply_events(batch(vec![join(0, "1", "BP_Stego_C", 1.0)]));
        let report = r.apply_events(batch(vec![join(50, "1", "BP_Dilo_C", 0.25)]));
        assert!(matches!(
            report.changes.as_slice(),
            [ChangeRecord::ChangedSpecies { from, to, .. }]
                if from == "Stegosaurus" && to == "Dilophosaurus"
        ));
        assert!(!r.population().census().contains("Stegosaurus"));
        assert_eq!(r.population().census().get("Dilophosaurus"), 1);
    }

    #[test]
    fn ticks_are_numbered_and_views_follow() {
        let mut r = reconciler(ZeroCountPolicy::Remove);
        assert_eq!(r.view().tick, 0);
        let report = r.apply(Observation::Events(batch(vec![join(0, "1", "Rex", 0.5)])));
        assert_eq!(report.tick, 1);
        assert_eq!(report.source, "event_tail");
        let view = r.view();
        assert_eq!(view.tick, 1);
        assert_eq!(view.total_players(), 1);
        assert_eq!(view.census.get("Rex"), 1);
    }
}
