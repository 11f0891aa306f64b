// crates/bento-registry-server/src/server.rs
// ============================================================================
// Module: Server Entry
// Description: Binds the API listener and runs the axum server.
// Purpose: Turn validated configuration into a running registry.
// Dependencies: axum, bento-registry-config, tokio
// ============================================================================

//! ## Overview
//! Wires configuration into [`RegistryState`], builds the router, binds the
//! configured address, and serves until the process is stopped. Startup
//! failures (bad bind address, unbindable port) are errors; downstream
//! service reachability is not checked at startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;

use bento_registry_config::RegistryConfig;
use thiserror::Error;

use crate::routes::router;
use crate::state::RegistryState;
use crate::state::StateError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Application state could not be wired.
    #[error("state: {0}")]
    State(#[from] StateError),
    /// The configured bind address is not parseable.
    #[error("invalid bind address: {0}")]
    Bind(String),
    /// The listener could not be bound or the server failed.
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Runs the registry server until the process is stopped.
///
/// # Errors
///
/// Returns [`ServerError`] when state wiring, address parsing, binding, or
/// serving fails.
pub async fn serve(config: RegistryConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|_| ServerError::Bind(config.server.bind.clone()))?;
    let state = RegistryState::from_config(&config)?;
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "bento service registry listening");
    axum::serve(listener, app).await?;
    Ok(())
}
