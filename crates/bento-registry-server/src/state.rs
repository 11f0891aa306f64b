// crates/bento-registry-server/src/state.rs
// ============================================================================
// Module: Registry State
// Description: Shared application state wired from configuration.
// Purpose: Own the aggregation stack behind the HTTP handlers.
// Dependencies: bento-registry-aggregate, bento-registry-config
// ============================================================================

//! ## Overview
//! [`RegistryState`] wires configuration into the aggregation stack once at
//! startup: the HTTP client context, manifest cache, self record provider
//! (git-backed in debug mode), and the three aggregators. The state is
//! cheaply cloneable and shared across handlers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use bento_registry_aggregate::ClientError;
use bento_registry_aggregate::DataTypeAggregator;
use bento_registry_aggregate::GitVersionMetadata;
use bento_registry_aggregate::HttpClientContext;
use bento_registry_aggregate::ManifestCache;
use bento_registry_aggregate::NoopVersionMetadata;
use bento_registry_aggregate::SelfInfoProvider;
use bento_registry_aggregate::ServiceAggregator;
use bento_registry_aggregate::VersionMetadataProvider;
use bento_registry_aggregate::WorkflowAggregator;
use bento_registry_config::RegistryConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while wiring application state.
#[derive(Debug, Error)]
pub enum StateError {
    /// HTTP client construction failed.
    #[error("http client: {0}")]
    Client(#[from] ClientError),
}

// ============================================================================
// SECTION: Registry State
// ============================================================================

/// Shared application state behind the HTTP handlers.
#[derive(Debug, Clone)]
pub struct RegistryState {
    /// Manifest cache serving the raw descriptor mapping.
    pub manifest: Arc<ManifestCache>,
    /// Local record source for the registry's own kind.
    pub self_info: Arc<SelfInfoProvider>,
    /// Service list aggregator.
    pub services: Arc<ServiceAggregator>,
    /// Data type aggregator.
    pub data_types: Arc<DataTypeAggregator>,
    /// Workflow aggregator.
    pub workflows: Arc<WorkflowAggregator>,
}

impl RegistryState {
    /// Wires application state from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the HTTP client cannot be built.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, StateError> {
        let client = HttpClientContext::new(
            Duration::from_millis(config.contact.timeout_ms),
            config.contact.validate_ssl,
        )?;
        let manifest = Arc::new(ManifestCache::new(
            config.manifest.path.clone(),
            config.node.url_vars(),
        ));
        let metadata: Arc<dyn VersionMetadataProvider> = if config.contact.debug {
            Arc::new(GitVersionMetadata::new(std::env::current_dir().unwrap_or_default()))
        } else {
            Arc::new(NoopVersionMetadata)
        };
        let self_info = Arc::new(SelfInfoProvider::new(
            config.identity.clone(),
            config.contact.debug,
            metadata,
        ));
        let services = Arc::new(ServiceAggregator::new(
            client.clone(),
            Arc::clone(&manifest),
            Arc::clone(&self_info),
            Duration::from_secs(config.cache.service_ttl_secs),
        ));
        let data_types = Arc::new(DataTypeAggregator::new(
            client.clone(),
            Arc::clone(&services),
            Duration::from_secs(config.cache.data_type_ttl_secs),
        ));
        let workflows = Arc::new(WorkflowAggregator::new(
            client,
            Arc::clone(&services),
            Duration::from_secs(config.cache.workflow_ttl_secs),
        ));
        Ok(Self {
            manifest,
            self_info,
            services,
            data_types,
            workflows,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use bento_registry_config::RegistryConfig;

    use super::RegistryState;

    #[test]
    fn state_wires_from_minimal_config() {
        let config = RegistryConfig::from_toml(
            r#"
            [node]
            bento_url = "http://127.0.0.1:5000"
            bento_public_url = "http://127.0.0.1:5000"
            bento_portal_public_url = "http://127.0.0.1:5000"

            [manifest]
            path = "/etc/bento/bento_services.json"
            "#,
        )
        .unwrap();
        let state = RegistryState::from_config(&config).unwrap();
        assert_eq!(state.self_info.kind().as_str(), "service-registry");
    }
}
