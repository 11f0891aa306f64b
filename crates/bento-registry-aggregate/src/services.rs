// crates/bento-registry-aggregate/src/services.rs
// ============================================================================
// Module: Service Aggregation
// Description: Fans out to manifest services' service-info endpoints.
// Purpose: Produce the best-effort aggregated service list with caching.
// Dependencies: bento-registry-core, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! One aggregation round contacts every manifest service's `service-info`
//! endpoint concurrently under a shared deadline, substituting the locally
//! built record for the registry's own kind. Rounds are coalesced per
//! credential digest so concurrent identical requests share one fan-out,
//! and only rounds in which every service answered are cached; partial
//! rounds are served but re-attempted on the next request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bento_registry_core::AuthzContext;
use bento_registry_core::ServiceDescriptor;
use bento_registry_core::ServiceInfoRecord;
use bento_registry_core::ServiceKind;
use tokio::task::JoinSet;

use crate::cache::TtlCache;
use crate::client::HttpClientContext;
use crate::client::join_endpoint;
use crate::flight::FlightGroup;
use crate::manifest_cache::ManifestCache;
use crate::self_info::SelfInfoProvider;

// ============================================================================
// SECTION: Round Result
// ============================================================================

/// Outcome of one service-info fan-out round.
#[derive(Debug, Clone)]
struct ServiceRound {
    /// Records in manifest order, excluding failed services.
    records: Vec<ServiceInfoRecord>,
    /// Whether every manifest service answered.
    complete: bool,
}

// ============================================================================
// SECTION: Service Aggregator
// ============================================================================

/// Aggregates service-info records across the node's manifest.
///
/// # Invariants
/// - Cached rounds are complete rounds; partial results are never cached.
/// - Cache entries are partitioned by credential digest.
#[derive(Debug)]
pub struct ServiceAggregator {
    /// Shared HTTP context for downstream calls.
    client: HttpClientContext,
    /// Manifest view naming the services to contact.
    manifest: Arc<ManifestCache>,
    /// Local record source for the registry's own kind.
    self_info: Arc<SelfInfoProvider>,
    /// Complete rounds keyed by credential digest.
    cache: TtlCache<String, Vec<ServiceInfoRecord>>,
    /// Coalesces concurrent rounds per credential digest.
    flight: FlightGroup<String, ServiceRound>,
}

impl ServiceAggregator {
    /// Creates an aggregator with the given round cache TTL.
    #[must_use]
    pub fn new(
        client: HttpClientContext,
        manifest: Arc<ManifestCache>,
        self_info: Arc<SelfInfoProvider>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            manifest,
            self_info,
            cache: TtlCache::new(ttl),
            flight: FlightGroup::new(),
        }
    }

    /// Returns the aggregated service list for the caller's credential.
    ///
    /// Serves from the per-credential cache when a complete round is fresh;
    /// otherwise runs (or joins) one fan-out round.
    pub async fn get_services(&self, authz: &AuthzContext) -> Vec<ServiceInfoRecord> {
        let digest = authz.digest();
        if let Some(records) = self.cache.get(&digest) {
            return records;
        }
        self.cache.sweep_expired();
        let round = self
            .flight
            .run(digest.clone(), || self.fetch_round(authz))
            .await;
        if round.complete {
            self.cache.insert(digest, round.records.clone());
        } else {
            tracing::warn!(
                reachable = round.records.len(),
                "service round incomplete; result not cached"
            );
        }
        round.records
    }

    /// Fetches one service's record by its manifest kind, bypassing the
    /// round cache.
    pub async fn fetch_one(
        &self,
        authz: &AuthzContext,
        kind: &ServiceKind,
    ) -> Option<ServiceInfoRecord> {
        let manifest = self.manifest.get().await;
        let descriptor = manifest.get(kind)?;
        if kind == self.self_info.kind() {
            return Some(self.own_record(descriptor).await);
        }
        let deadline = self.client.round_deadline();
        fetch_remote(&self.client, authz, kind, &descriptor.url, deadline).await
    }

    /// Runs one full fan-out round over the manifest.
    async fn fetch_round(&self, authz: &AuthzContext) -> ServiceRound {
        let manifest = self.manifest.get().await;
        let deadline = self.client.round_deadline();
        let mut results: BTreeMap<ServiceKind, ServiceInfoRecord> = BTreeMap::new();
        let mut complete = true;

        let mut tasks: JoinSet<(ServiceKind, Option<ServiceInfoRecord>)> = JoinSet::new();
        for (kind, descriptor) in &manifest {
            if kind == self.self_info.kind() {
                results.insert(kind.clone(), self.own_record(descriptor).await);
                continue;
            }
            let client = self.client.clone();
            let authz = authz.clone();
            let kind = kind.clone();
            let url = descriptor.url.clone();
            tasks.spawn(async move {
                let record = fetch_remote(&client, &authz, &kind, &url, deadline).await;
                (kind, record)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Some(record))) => {
                    results.insert(kind, record);
                }
                Ok((_, None)) => {
                    complete = false;
                }
                Err(err) => {
                    tracing::error!(error = %err, "service fan-out task failed");
                    complete = false;
                }
            }
        }

        ServiceRound {
            records: results.into_values().collect(),
            complete,
        }
    }

    /// Builds the self record annotated with its manifest URL.
    async fn own_record(&self, descriptor: &ServiceDescriptor) -> ServiceInfoRecord {
        let mut record = self.self_info.record().await;
        record.url = Some(descriptor.url.clone());
        record
    }
}

/// Contacts one remote service's service-info endpoint.
async fn fetch_remote(
    client: &HttpClientContext,
    authz: &AuthzContext,
    kind: &ServiceKind,
    base_url: &str,
    deadline: tokio::time::Instant,
) -> Option<ServiceInfoRecord> {
    let url = match join_endpoint(base_url, "service-info") {
        Some(url) => url,
        None => {
            tracing::error!(kind = %kind, base_url, "unusable service base URL");
            return None;
        }
    };
    let value = client.get_json(authz, &url, &[], deadline).await?;
    match serde_json::from_value::<ServiceInfoRecord>(value) {
        Ok(mut record) => {
            record.url = Some(base_url.to_string());
            Some(record)
        }
        Err(err) => {
            tracing::error!(kind = %kind, url, error = %err, "malformed service-info document");
            None
        }
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

    use bento_registry_core::AuthzContext;
    use bento_registry_core::ServiceKind;

    use crate::testing::registry_fixture;

    #[tokio::test]
    async fn unknown_kind_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = registry_fixture(&dir, "{}");
        let record = fixture
            .services
            .fetch_one(&AuthzContext::anonymous(), &ServiceKind::new("missing"))
            .await;
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn self_kind_is_answered_without_network() {
        let dir = tempfile::tempdir().unwrap();
        // An unroutable URL proves the record comes from the local provider.
        let fixture = registry_fixture(
            &dir,
            r#"{
                "service-registry": {
                    "url_template": "http://192.0.2.1:1/api/{service_kind}",
                    "repository": "r",
                    "service_kind": "service-registry"
                }
            }"#,
        );
        let record = fixture
            .services
            .fetch_one(&AuthzContext::anonymous(), &ServiceKind::new("service-registry"))
            .await
            .unwrap();
        assert_eq!(record.kind().as_str(), "service-registry");
        assert_eq!(
            record.url.as_deref(),
            Some("http://192.0.2.1:1/api/service-registry")
        );

        let listed = fixture.services.get_services(&AuthzContext::anonymous()).await;
        assert_eq!(listed.len(), 1);
    }
}
