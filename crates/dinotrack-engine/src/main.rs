//! Tracker binary for the Dinotrack live census.
//!
//! Wires the configured observation source, the status refresh loop and
//! the Observer API together and runs them until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `dinotrack-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the catalog, normalizer and reconciler
//! 4. Start the Observer API server
//! 5. Spawn the source loop for the configured mode
//! 6. Spawn the status loop
//! 7. On `Ctrl-C`, stop both timers, then release the transport

mod error;
mod sinks;

use std::path::Path;
use std::sync::Arc;

use dinotrack_census::NameNormalizer;
use dinotrack_core::config::{DinotrackConfig, TrackerMode};
use dinotrack_core::parse::LogParser;
use dinotrack_core::reconciler::{Reconciler, ReconcilerSettings};
use dinotrack_core::scheduler::{run_source, run_status, SourceRun, Tracker};
use dinotrack_core::snapshot::SnapshotSource;
use dinotrack_core::source::ObservationSource;
use dinotrack_core::tail::EventTailSource;
use dinotrack_observer::{spawn_observer, AppState, ServerConfig};
use dinotrack_transport::{FileLogReader, PlayerDataParser, RconClient};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::sinks::{LogStatusSink, ObserverSink};

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "dinotrack-config.yaml";

/// Totals of a finished source loop.
#[derive(Debug, Clone, Copy)]
struct LoopSummary {
    source: &'static str,
    ticks: u64,
    failures: u64,
}

/// Application entry point for the tracker.
///
/// # Errors
///
/// Returns an error if configuration, observer startup, or shutdown
/// signalling fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report afterwards.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("dinotrack-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        mode = ?config.tracker.mode,
        poll_interval_ms = config.tracker.poll_interval_ms,
        status_interval_ms = config.tracker.status_interval_ms,
        zero_counts = ?config.tracker.zero_count_policy(),
        "Configuration loaded"
    );

    run(&config).await?;

    info!("dinotrack-engine shutdown complete");
    Ok(())
}

async fn run(config: &DinotrackConfig) -> Result<(), EngineError> {
    // 3. Reconciler over the configured catalog.
    let catalog = Arc::new(config.catalog.clone());
    info!(species = catalog.len(), "Species catalog loaded");
    let tracker = Tracker::new(Reconciler::new(
        NameNormalizer::new(Arc::clone(&catalog)),
        ReconcilerSettings::from(&config.tracker),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 4. Observer API.
    let app_state = Arc::new(AppState::new(tracker.view(), Arc::clone(&catalog)));
    let observer = if config.observer.enabled {
        let server = ServerConfig::from(&config.observer);
        Some(spawn_observer(&server, Arc::clone(&app_state), shutdown_rx.clone()).await?)
    } else {
        info!("Observer API disabled");
        None
    };
    let sink = ObserverSink::new(observer.is_some().then_some(app_state));

    // 5. Source loop.
    let source = spawn_source(config, tracker.clone(), sink, shutdown_rx.clone())?;

    // 6. Status loop.
    let status = {
        let view = tracker.view();
        let period = config.tracker.status_interval();
        tokio::spawn(async move {
            run_status(view, catalog, &mut LogStatusSink, period, shutdown_rx).await
        })
    };

    // 7. Shutdown.
    tokio::signal::ctrl_c()
        .await
        .map_err(|source| EngineError::Signal { source })?;
    info!("Shutdown requested, stopping loops");
    let _ = shutdown_tx.send(true);

    let summary = source.await?;
    let refreshes = status.await?;
    if let Some(handle) = observer {
        handle.await?;
    }

    info!(
        source = summary.source,
        ticks = summary.ticks,
        failures = summary.failures,
        refreshes,
        "Loops stopped"
    );
    Ok(())
}

/// Spawn the source loop for the configured mode.
fn spawn_source(
    config: &DinotrackConfig,
    tracker: Tracker,
    mut sink: ObserverSink,
    shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<LoopSummary>, EngineError> {
    let period = config.tracker.poll_interval();

    match config.tracker.mode {
        TrackerMode::Snapshot => {
            let client = RconClient::new(&config.rcon, PlayerDataParser::new()?);
            info!(address = client.address(), "Snapshot source selected");
            let source = SnapshotSource::new(client);
            Ok(tokio::spawn(async move {
                release(run_source(tracker, source, &mut sink, period, shutdown).await)
            }))
        }
        TrackerMode::EventTail => {
            let reader = FileLogReader::new(config.log_tail.path.clone());
            info!(path = %reader.path().display(), "Event-tail source selected");
            let source = EventTailSource::new(reader, LogParser::new()?);
            Ok(tokio::spawn(async move {
                release(run_source(tracker, source, &mut sink, period, shutdown).await)
            }))
        }
    }
}

/// Drop the source's transport once its timer has stopped.
fn release<S: ObservationSource>(run: SourceRun<S>) -> LoopSummary {
    let source = run.source.name();
    drop(run.source);
    debug!(source, "Transport released");
    LoopSummary {
        source,
        ticks: run.ticks,
        failures: run.failures,
    }
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults.
///
/// Environment overrides apply either way. The flag reports whether the
/// file was found.
fn load_config() -> Result<(DinotrackConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((DinotrackConfig::from_file(config_path)?, true))
    } else {
        let mut config = DinotrackConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}
