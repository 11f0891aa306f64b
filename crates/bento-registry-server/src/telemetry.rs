// crates/bento-registry-server/src/telemetry.rs
// ============================================================================
// Module: Telemetry
// Description: Process-wide tracing subscriber initialization.
// Purpose: Emit structured logs at the configured level.
// Dependencies: tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! Installs the global `tracing` subscriber. The configured level acts as a
//! default; the `RUST_LOG` environment variable overrides it with a full
//! filter directive when set. Initialization is idempotent so tests can
//! call it repeatedly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Initialization
// ============================================================================

/// Initializes the global tracing subscriber with the given default level.
///
/// Subsequent calls are no-ops.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
