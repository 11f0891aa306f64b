// crates/bento-registry-config/src/lib.rs
// ============================================================================
// Module: Bento Registry Config
// Description: Configuration loading and validation for the registry.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bento-registry-core, serde, toml
// ============================================================================

//! ## Overview
//! Canonical configuration for the Bento service registry, loaded from a
//! TOML file with strict size limits and numeric range validation. Invalid
//! configuration fails startup closed; only manifest problems degrade at
//! runtime.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CacheConfig;
pub use config::SERVICE_ARTIFACT;
pub use config::SERVICE_GROUP;
pub use config::ConfigError;
pub use config::ContactConfig;
pub use config::IdentityConfig;
pub use config::LogConfig;
pub use config::ManifestConfig;
pub use config::NodeConfig;
pub use config::RegistryConfig;
pub use config::ServerConfig;
