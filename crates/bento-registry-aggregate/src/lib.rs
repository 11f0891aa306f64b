// crates/bento-registry-aggregate/src/lib.rs
// ============================================================================
// Module: Bento Registry Aggregate
// Description: Service, data-type, and workflow aggregation engine.
// Purpose: Fan out to downstream services with caching and coalescing.
// Dependencies: bento-registry-core, reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! The aggregation engine contacts every manifest-registered service's own
//! discovery endpoints (`/service-info`, `/data-types`, `/workflows`)
//! concurrently with a shared per-round deadline, normalizes and validates
//! the heterogeneous responses at the boundary, and caches best-effort
//! aggregates in credential-partitioned TTL caches with single-flight
//! coalescing. Downstream failures are logged and excluded, never
//! propagated: the worst case aggregate is this registry's own record alone.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cache;
pub mod client;
pub mod data_types;
pub mod flight;
pub mod manifest_cache;
pub mod self_info;
pub mod services;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::TtlCache;
pub use client::ClientError;
pub use client::HttpClientContext;
pub use data_types::DataTypeAggregator;
pub use data_types::DataTypeScope;
pub use flight::FlightGroup;
pub use manifest_cache::ManifestCache;
pub use self_info::GitMetadata;
pub use self_info::GitVersionMetadata;
pub use self_info::NoopVersionMetadata;
pub use self_info::SelfInfoProvider;
pub use self_info::VersionMetadataProvider;
pub use services::ServiceAggregator;
pub use workflows::WorkflowAggregator;
