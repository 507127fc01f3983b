//! Configuration loading and typed config structures for the tracker.
//!
//! The canonical configuration lives in `dinotrack-config.yaml` next to the
//! binary. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads the file and applies environment
//! overrides for the connection settings operators usually keep out of
//! version control.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dinotrack_census::{KnownSpeciesCatalog, ZeroCountPolicy};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `dinotrack-config.yaml`. Every field has a
/// default, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DinotrackConfig {
    /// RCON connection settings.
    #[serde(default)]
    pub rcon: RconConfig,

    /// Which source to run and how often.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Server log location for the event-tail source.
    #[serde(default)]
    pub log_tail: LogTailConfig,

    /// Read-only HTTP API settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Known species per category and the class-name alias table.
    #[serde(default)]
    pub catalog: KnownSpeciesCatalog,
}

impl DinotrackConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `RCON_HOST` overrides `rcon.host`
    /// - `RCON_PORT` overrides `rcon.port` (ignored unless a valid port)
    /// - `RCON_PASS` overrides `rcon.password`
    /// - `DINOTRACK_LOG_PATH` overrides `log_tail.path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Override connection settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override connection settings from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("RCON_HOST") {
            self.rcon.host = host;
        }
        if let Some(port) = lookup("RCON_PORT").and_then(|raw| raw.trim().parse().ok()) {
            self.rcon.port = port;
        }
        if let Some(password) = lookup("RCON_PASS") {
            self.rcon.password = password;
        }
        if let Some(path) = lookup("DINOTRACK_LOG_PATH") {
            self.log_tail.path = PathBuf::from(path);
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// RCON connection settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RconConfig {
    /// Server hostname or IP address.
    #[serde(default = "default_rcon_host")]
    pub host: String,

    /// RCON TCP port.
    #[serde(default = "default_rcon_port")]
    pub port: u16,

    /// RCON password.
    #[serde(default)]
    pub password: String,

    /// Quiet period, in milliseconds, that ends a response. The protocol
    /// has no length prefix, so a reply is complete once the server stops
    /// sending for this long.
    #[serde(default = "default_rcon_response_gap_ms")]
    pub response_gap_ms: u64,
}

impl RconConfig {
    /// `host:port` form for connecting.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: default_rcon_host(),
            port: default_rcon_port(),
            password: String::new(),
            response_gap_ms: default_rcon_response_gap_ms(),
        }
    }
}

impl core::fmt::Debug for RconConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RconConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("response_gap_ms", &self.response_gap_ms)
            .finish()
    }
}

/// Which observation model to deploy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerMode {
    /// Poll the full player list over RCON and diff it against the roster.
    #[default]
    Snapshot,
    /// Tail the server log and apply join and leave events incrementally.
    EventTail,
}

impl TrackerMode {
    /// Zero-count policy implied by the mode.
    ///
    /// The snapshot display enumerates the whole catalog, so zero entries
    /// are kept; the event-tail display lists observed species only.
    pub const fn default_zero_counts(self) -> ZeroCountPolicy {
        match self {
            Self::Snapshot => ZeroCountPolicy::Retain,
            Self::EventTail => ZeroCountPolicy::Remove,
        }
    }
}

/// Tracker scheduling and reconciliation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerConfig {
    /// Which source to run.
    #[serde(default)]
    pub mode: TrackerMode,

    /// Milliseconds between source ticks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Milliseconds between status board refreshes.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,

    /// Growth value that marks a freshly created creature.
    #[serde(default = "default_fresh_spawn_growth")]
    pub fresh_spawn_growth: f32,

    /// Consecutive detail failures before a warning is logged. Zero
    /// disables the warning.
    #[serde(default = "default_detail_failure_warn_ticks")]
    pub detail_failure_warn_ticks: u32,

    /// Explicit zero-count policy. When absent the mode decides.
    #[serde(default)]
    pub zero_counts: Option<ZeroCountPolicy>,
}

impl TrackerConfig {
    /// The effective zero-count policy.
    pub fn zero_count_policy(&self) -> ZeroCountPolicy {
        self.zero_counts
            .unwrap_or_else(|| self.mode.default_zero_counts())
    }

    /// Source tick period. Never shorter than one millisecond.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(clamp_period_ms(self.poll_interval_ms))
    }

    /// Status refresh period. Never shorter than one millisecond.
    pub const fn status_interval(&self) -> Duration {
        Duration::from_millis(clamp_period_ms(self.status_interval_ms))
    }
}

const fn clamp_period_ms(ms: u64) -> u64 {
    if ms == 0 { 1 } else { ms }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mode: TrackerMode::default(),
            poll_interval_ms: default_poll_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
            fresh_spawn_growth: default_fresh_spawn_growth(),
            detail_failure_warn_ticks: default_detail_failure_warn_ticks(),
            zero_counts: None,
        }
    }
}

/// Server log location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogTailConfig {
    /// Path of the server log, mounted or synced locally.
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for LogTailConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

/// Observer HTTP API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the API at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when
    /// set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_rcon_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_rcon_port() -> u16 {
    8888
}

const fn default_rcon_response_gap_ms() -> u64 {
    100
}

const fn default_poll_interval_ms() -> u64 {
    60_000
}

const fn default_status_interval_ms() -> u64 {
    60_000
}

const fn default_fresh_spawn_growth() -> f32 {
    0.25
}

const fn default_detail_failure_warn_ticks() -> u32 {
    5
}

fn default_log_path() -> PathBuf {
    PathBuf::from("TheIsle/Saved/Logs/TheIsle-Shipping.log")
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8090
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
