// crates/bento-registry-core/src/manifest.rs
// ============================================================================
// Module: Service Manifest
// Description: Parsing and URL template resolution for the node manifest.
// Purpose: Turn the static bento_services.json file into service descriptors.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The manifest is a JSON object mapping compose-level identifiers to service
//! entries with a `url_template` and metadata flags. Parsing resolves each
//! template against the node's base URLs, filters disabled or kind-less
//! entries (external/"transparent" services such as the gateway), and keys
//! the result by [`ServiceKind`]. Unresolved template variables are a load
//! error, never a request-time surprise. This module is pure: file I/O and
//! caching policy belong to callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identifiers::ServiceKind;

// ============================================================================
// SECTION: Template Variables
// ============================================================================

/// Node-level URL variables available to manifest URL templates.
///
/// # Invariants
/// - All three URLs are non-empty, validated at configuration load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlVars {
    /// The node's own (internal) base URL.
    pub bento_url: String,
    /// The node's public base URL.
    pub bento_public_url: String,
    /// The node's portal public base URL.
    pub bento_portal_public_url: String,
}

// ============================================================================
// SECTION: Manifest Entries
// ============================================================================

/// Raw manifest entry as it appears on disk, before resolution.
#[derive(Debug, Clone, Deserialize)]
struct RawManifestEntry {
    /// URL template with `{VAR}` placeholders.
    url_template: Option<String>,
    /// Source repository for the service (informational).
    repository: Option<String>,
    /// Stable service kind; entries without one are external/transparent.
    service_kind: Option<String>,
    /// Whether the service exposes `/data-types`.
    #[serde(default)]
    data_service: bool,
    /// Whether the service exposes `/workflows` without being a data service.
    #[serde(default)]
    workflow_provider: bool,
    /// Disabled entries are filtered out at load time.
    #[serde(default)]
    disabled: bool,
    /// Legacy flag for table-manageable services.
    manageable_tables: Option<bool>,
}

/// One live manifest entry with its URL template resolved.
///
/// # Invariants
/// - `service_kind` is non-empty and unique within the manifest.
/// - `url` contains no unresolved `{VAR}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    /// Stable service kind for this entry.
    pub service_kind: ServiceKind,
    /// Resolved base URL for the service.
    pub url: String,
    /// Source repository for the service (informational).
    pub repository: String,
    /// Whether the service exposes `/data-types`.
    pub data_service: bool,
    /// Whether the service exposes `/workflows` without being a data service.
    pub workflow_provider: bool,
    /// Legacy flag for table-manageable services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manageable_tables: Option<bool>,
}

/// Live manifest entries keyed by service kind.
pub type ServicesByKind = BTreeMap<ServiceKind, ServiceDescriptor>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or interpreting the service manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("manifest read failed: {0}")]
    Read(String),
    /// The manifest file is not well-formed.
    #[error("manifest parse failed: {0}")]
    Parse(String),
    /// A URL template references an unknown variable.
    #[error("unresolved template variable {{{variable}}} in manifest entry {entry}")]
    Template {
        /// The unresolved variable name.
        variable: String,
        /// The manifest entry (compose id) containing the template.
        entry: String,
    },
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses manifest text into live descriptors keyed by service kind.
///
/// Disabled entries and entries without a `service_kind` are filtered out.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] when the text is not a JSON object of
/// manifest entries or a live entry lacks `url_template`, and
/// [`ManifestError::Template`] when a template references an unknown
/// variable.
pub fn parse_manifest(text: &str, vars: &UrlVars) -> Result<ServicesByKind, ManifestError> {
    let raw: BTreeMap<String, RawManifestEntry> =
        serde_json::from_str(text).map_err(|err| ManifestError::Parse(err.to_string()))?;
    let mut services = ServicesByKind::new();
    for (compose_id, entry) in raw {
        if entry.disabled {
            continue;
        }
        let Some(kind) = entry.service_kind.as_deref().filter(|kind| !kind.is_empty()) else {
            continue;
        };
        let template = entry.url_template.as_deref().ok_or_else(|| {
            ManifestError::Parse(format!("manifest entry {compose_id} is missing url_template"))
        })?;
        let url = resolve_template(template, &compose_id, &entry, vars)?;
        services.insert(
            ServiceKind::new(kind),
            ServiceDescriptor {
                service_kind: ServiceKind::new(kind),
                url,
                repository: entry.repository.clone().unwrap_or_default(),
                data_service: entry.data_service,
                workflow_provider: entry.workflow_provider,
                manageable_tables: entry.manageable_tables,
            },
        );
    }
    Ok(services)
}

/// Resolves `{VAR}` placeholders against node URLs and entry fields.
fn resolve_template(
    template: &str,
    compose_id: &str,
    entry: &RawManifestEntry,
    vars: &UrlVars,
) -> Result<String, ManifestError> {
    let mut resolved = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '{' {
            resolved.push(ch);
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            name.push(inner);
        }
        if !closed {
            return Err(ManifestError::Parse(format!(
                "unterminated template placeholder in manifest entry {compose_id}"
            )));
        }
        let value = lookup_variable(&name, entry, vars).ok_or_else(|| ManifestError::Template {
            variable: name,
            entry: compose_id.to_string(),
        })?;
        resolved.push_str(&value);
    }
    Ok(resolved)
}

/// Looks up one template variable by name.
fn lookup_variable(name: &str, entry: &RawManifestEntry, vars: &UrlVars) -> Option<String> {
    match name {
        "BENTO_URL" => Some(vars.bento_url.clone()),
        "BENTO_PUBLIC_URL" => Some(vars.bento_public_url.clone()),
        "BENTO_PORTAL_PUBLIC_URL" => Some(vars.bento_portal_public_url.clone()),
        "service_kind" => entry.service_kind.clone(),
        "repository" => entry.repository.clone(),
        _ => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
