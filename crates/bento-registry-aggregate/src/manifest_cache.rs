// crates/bento-registry-aggregate/src/manifest_cache.rs
// ============================================================================
// Module: Manifest Cache
// Description: Process-lifetime cache over the service manifest file.
// Purpose: Read the manifest once and degrade to empty on failure.
// Dependencies: bento-registry-core, tokio, tracing
// ============================================================================

//! ## Overview
//! The manifest is static for the lifetime of a deployment, so a successful
//! read is cached for the process lifetime; [`ManifestCache::reload`]
//! re-reads it on demand. Read or parse failures are logged and degrade to
//! an empty mapping without being cached, so the registry starts (listing
//! zero services) and the next request retries the file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use bento_registry_core::ServicesByKind;
use bento_registry_core::UrlVars;
use bento_registry_core::parse_manifest;

// ============================================================================
// SECTION: Manifest Cache
// ============================================================================

/// Cached, resolved view of the node's service manifest.
///
/// # Invariants
/// - Only successful loads are cached; failures always retry.
/// - The manifest file is never written.
#[derive(Debug)]
pub struct ManifestCache {
    /// Path to the manifest file.
    path: PathBuf,
    /// Node URL variables for template resolution.
    vars: UrlVars,
    /// Cached descriptors from the last successful load.
    cached: Mutex<Option<ServicesByKind>>,
}

impl ManifestCache {
    /// Creates a cache over the given manifest file.
    #[must_use]
    pub fn new(path: PathBuf, vars: UrlVars) -> Self {
        Self {
            path,
            vars,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached manifest, loading it on first use.
    pub async fn get(&self) -> ServicesByKind {
        if let Some(services) = self.lock().clone() {
            return services;
        }
        self.reload().await
    }

    /// Re-reads the manifest file, replacing the cached view on success.
    pub async fn reload(&self) -> ServicesByKind {
        match self.load().await {
            Some(services) => {
                *self.lock() = Some(services.clone());
                services
            }
            None => ServicesByKind::new(),
        }
    }

    /// Reads and parses the manifest file; `None` on any failure.
    async fn load(&self) -> Option<ServicesByKind> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %err,
                    "manifest read failed; serving empty service set"
                );
                return None;
            }
        };
        match parse_manifest(&text, &self.vars) {
            Ok(services) => Some(services),
            Err(err) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %err,
                    "manifest invalid; serving empty service set"
                );
                None
            }
        }
    }

    /// Locks the cached slot, recovering from a poisoned mutex.
    fn lock(&self) -> MutexGuard<'_, Option<ServicesByKind>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
