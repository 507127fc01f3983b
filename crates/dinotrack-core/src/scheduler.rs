//! Tick scheduling.
//!
//! [`Tracker`] couples the reconciler with the published view. A tick
//! observes outside the lock, then applies the observation and publishes
//! the new view inside one critical section, so readers only ever see a
//! whole tick.
//!
//! [`run_source`] drives one observation source on a fixed interval and
//! [`run_status`] refreshes the status board on its own interval. Both
//! loops skip, rather than queue, ticks that fall due while a previous tick
//! is still running, and both stop when the shutdown signal flips.

use std::sync::Arc;
use std::time::Duration;

use dinotrack_census::KnownSpeciesCatalog;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::notify::{render_change, ChangeSink, NotifyError};
use crate::reconciler::{Reconciler, TickReport};
use crate::source::{Observation, ObservationSource, SourceError};
use crate::status::StatusBoard;
use crate::view::SharedView;

/// Receives the rendered status board on every refresh.
pub trait StatusSink: Send {
    /// Handle one refresh.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the board could not be delivered.
    fn on_status(&mut self, board: &StatusBoard) -> Result<(), NotifyError>;
}

/// Shared reconciler plus its published view.
#[derive(Debug, Clone)]
pub struct Tracker {
    reconciler: Arc<Mutex<Reconciler>>,
    view: SharedView,
}

impl Tracker {
    /// Wrap a reconciler and publish its initial view.
    pub fn new(reconciler: Reconciler) -> Self {
        let view = reconciler.view().into_shared();
        Self {
            reconciler: Arc::new(Mutex::new(reconciler)),
            view,
        }
    }

    /// Handle to the published view.
    pub fn view(&self) -> SharedView {
        Arc::clone(&self.view)
    }

    /// Run one tick against a source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the source could not observe. The roster
    /// and census are untouched in that case.
    pub async fn tick<S: ObservationSource>(&self, source: &mut S) -> Result<TickReport, SourceError> {
        let observation = source.observe().await?;
        Ok(self.apply(observation).await)
    }

    /// Apply an observation and publish the resulting view.
    pub async fn apply(&self, observation: Observation) -> TickReport {
        let mut reconciler = self.reconciler.lock().await;
        let report = reconciler.apply(observation);
        let view = reconciler.view();
        *self.view.write().await = view;
        drop(reconciler);

        report
    }
}

/// Outcome of a source loop, returned at shutdown.
#[derive(Debug)]
pub struct SourceRun<S> {
    /// The source, handed back so its transport is released after the
    /// timer has stopped.
    pub source: S,
    /// Ticks that applied an observation.
    pub ticks: u64,
    /// Ticks aborted by a source error.
    pub failures: u64,
}

/// Tick `source` every `period` until `shutdown` becomes `true`.
///
/// Shutdown also interrupts an observation still waiting on its transport.
/// An interrupted tick leaves the roster and census untouched.
pub async fn run_source<S, C>(
    tracker: Tracker,
    mut source: S,
    sink: &mut C,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> SourceRun<S>
where
    S: ObservationSource,
    C: ChangeSink,
{
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;
    let mut failures: u64 = 0;

    let name = source.name();
    info!(
        source = name,
        interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        "Source loop starting"
    );

    while wait_for_tick(&mut timer, &mut shutdown).await {
        let observed = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => {
                info!(source = name, "Shutdown during observation, tick abandoned");
                break;
            }
            observed = source.observe() => observed,
        };

        match observed {
            Ok(observation) => {
                let report = tracker.apply(observation).await;
                ticks = ticks.saturating_add(1);
                log_report(&report);
                deliver(sink, &report);
            }
            Err(error) => {
                failures = failures.saturating_add(1);
                warn!(source = name, error = %error, "Tick aborted, state unchanged");
            }
        }
    }

    info!(source = name, ticks, failures, "Source loop stopped");
    SourceRun {
        source,
        ticks,
        failures,
    }
}

/// Render the status board every `period` until `shutdown` becomes `true`.
pub async fn run_status<T: StatusSink>(
    view: SharedView,
    catalog: Arc<KnownSpeciesCatalog>,
    sink: &mut T,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut refreshes: u64 = 0;

    while wait_for_tick(&mut timer, &mut shutdown).await {
        let board = {
            let view = view.read().await;
            StatusBoard::build(&view, &catalog)
        };
        if let Err(error) = sink.on_status(&board) {
            warn!(error = %error, "Status refresh not delivered");
        }
        refreshes = refreshes.saturating_add(1);
    }

    debug!(refreshes, "Status loop stopped");
    refreshes
}

/// Wait for the next tick. Returns `false` once shutdown is requested.
async fn wait_for_tick(
    timer: &mut tokio::time::Interval,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        if *shutdown.borrow() {
            return false;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
            _ = timer.tick() => return true,
        }
    }
}

fn log_report(report: &TickReport) {
    if report.changes.is_empty() {
        debug!(tick = report.tick, source = report.source, "Tick applied, no changes");
    } else {
        info!(
            tick = report.tick,
            source = report.source,
            changes = report.changes.len(),
            "Tick applied"
        );
    }
    if !report.faults.is_empty() || report.drift.is_some() {
        warn!(
            tick = report.tick,
            faults = report.faults.len(),
            drift = report.drift.is_some(),
            "Tick repaired census inconsistencies"
        );
    }
}

fn deliver<C: ChangeSink>(sink: &mut C, report: &TickReport) {
    for change in &report.changes {
        if let Err(error) = sink.on_change(change) {
            warn!(
                tick = report.tick,
                player_id = %change.player_id(),
                text = %render_change(change),
                error = %error,
                "Change notification not delivered"
            );
        }
    }
}
