//! Error types for the tracker binary.

/// Top-level error for the tracker binary.
///
/// Only startup and shutdown failures reach this type. Failures inside a
/// running tick are contained by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: dinotrack_core::config::ConfigError,
    },

    /// A log or reply pattern failed to compile.
    #[error("pattern error: {source}")]
    Pattern {
        /// The underlying regex error.
        #[from]
        source: regex::Error,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: dinotrack_observer::ServerError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A background loop panicked or was cancelled.
    #[error("task error: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
