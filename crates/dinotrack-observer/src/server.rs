//! Observer HTTP server lifecycle management.
//!
//! [`spawn_observer`] binds eagerly, so a bad address or a port in use is
//! reported to the caller, then serves on a background task until the
//! shutdown signal flips.

use std::net::SocketAddr;
use std::sync::Arc;

use dinotrack_core::config::ObserverConfig;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the Observer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ObserverConfig::default())
    }
}

impl From<&ObserverConfig> for ServerConfig {
    fn from(config: &ObserverConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

impl ServerConfig {
    /// Parse the configured socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if host and port do not form a valid
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address {}:{}: {e}", self.host, self.port)))
    }
}

/// Errors that can occur when starting or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind the listener for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or cannot be
/// bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the Observer API on `listener` until `shutdown` becomes `true`.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Bind, then serve the Observer API on a background task.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the listener cannot be bound. Errors
/// after that are logged by the background task.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, ServerError> {
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;
    info!(%addr, "Observer server listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = serve(listener, state, shutdown).await {
            error!(error = %e, "Observer server exited with error");
        }
        info!("Observer server stopped");
    }))
}
