// crates/bento-registry-server/src/lib.rs
// ============================================================================
// Module: Bento Registry Server
// Description: HTTP surface for the Bento service registry.
// Purpose: Expose registry and aggregation endpoints over axum.
// Dependencies: axum, bento-registry-aggregate, bento-registry-config, tokio
// ============================================================================

//! ## Overview
//! The server crate wires configuration into the aggregation engine and
//! exposes it over a small read-only HTTP API: the node's own service-info
//! document, the raw manifest, and the aggregated service, data-type, and
//! workflow views. Every endpoint is a GET; callers' `Authorization`
//! headers are forwarded downstream but never inspected here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod authz;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use routes::router;
pub use server::ServerError;
pub use server::serve;
pub use state::RegistryState;
pub use state::StateError;
pub use telemetry::init_tracing;
