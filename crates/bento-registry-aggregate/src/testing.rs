// crates/bento-registry-aggregate/src/testing.rs
// ============================================================================
// Module: Test Fixtures
// Description: Shared aggregator fixture for unit tests.
// Purpose: Wire the aggregation stack against a temporary manifest file.
// Dependencies: bento-registry-config, bento-registry-core, tempfile
// ============================================================================

//! ## Overview
//! Builds the full aggregation stack (manifest cache, self record provider,
//! and the three aggregators) against a manifest written into a temporary
//! directory, with short timeouts suitable for tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use bento_registry_config::IdentityConfig;
use bento_registry_core::UrlVars;

use crate::client::HttpClientContext;
use crate::data_types::DataTypeAggregator;
use crate::manifest_cache::ManifestCache;
use crate::self_info::NoopVersionMetadata;
use crate::self_info::SelfInfoProvider;
use crate::services::ServiceAggregator;
use crate::workflows::WorkflowAggregator;

/// The wired aggregation stack under test.
#[derive(Debug)]
pub(crate) struct RegistryFixture {
    /// Service list aggregator.
    pub services: Arc<ServiceAggregator>,
    /// Data type aggregator.
    pub data_types: DataTypeAggregator,
    /// Workflow aggregator.
    pub workflows: WorkflowAggregator,
}

/// Builds a fixture over a manifest written into `dir`.
pub(crate) fn registry_fixture(dir: &tempfile::TempDir, manifest_json: &str) -> RegistryFixture {
    let path = dir.path().join("bento_services.json");
    std::fs::write(&path, manifest_json).unwrap();
    let vars = UrlVars {
        bento_url: "http://127.0.0.1:0".to_string(),
        bento_public_url: "http://127.0.0.1:0".to_string(),
        bento_portal_public_url: "http://127.0.0.1:0".to_string(),
    };
    let manifest = Arc::new(ManifestCache::new(path, vars));
    let identity = IdentityConfig {
        service_id: "ca.c3g.bento:service-registry".to_string(),
        service_name: "Bento Service Registry".to_string(),
        description: "Registry and aggregator for Bento node services.".to_string(),
        contact_url: "mailto:info@c3g.ca".to_string(),
    };
    let self_info = Arc::new(SelfInfoProvider::new(
        identity,
        false,
        Arc::new(NoopVersionMetadata),
    ));
    let client = HttpClientContext::new(Duration::from_millis(500), true).unwrap();
    let services = Arc::new(ServiceAggregator::new(
        client.clone(),
        Arc::clone(&manifest),
        self_info,
        Duration::from_secs(30),
    ));
    let data_types = DataTypeAggregator::new(
        client.clone(),
        Arc::clone(&services),
        Duration::from_secs(30),
    );
    let workflows = WorkflowAggregator::new(client, Arc::clone(&services), Duration::from_secs(30));
    RegistryFixture {
        services,
        data_types,
        workflows,
    }
}
