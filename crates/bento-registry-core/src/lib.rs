// crates/bento-registry-core/src/lib.rs
// ============================================================================
// Module: Bento Registry Core
// Description: Data model for the Bento service registry.
// Purpose: Provide manifest descriptors, aggregated records, and credentials.
// Dependencies: serde, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! Core data model for the Bento service registry: manifest parsing with URL
//! template resolution, the GA4GH-style service-info record shape, data-type
//! and workflow record shapes, and the authorization context whose digest
//! partitions permission-sensitive caches. This crate performs no I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod authz;
pub mod identifiers;
pub mod manifest;
pub mod records;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use authz::AuthzContext;
pub use identifiers::ServiceId;
pub use identifiers::ServiceKind;
pub use manifest::ManifestError;
pub use manifest::ServiceDescriptor;
pub use manifest::ServicesByKind;
pub use manifest::UrlVars;
pub use manifest::parse_manifest;
pub use records::BentoInfoBlock;
pub use records::DataTypeRecord;
pub use records::ServiceInfoRecord;
pub use records::ServiceType;
pub use records::WorkflowsByPurpose;
