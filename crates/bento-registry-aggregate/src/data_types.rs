// crates/bento-registry-aggregate/src/data_types.rs
// ============================================================================
// Module: Data Type Aggregation
// Description: Fans out to data services' data-types endpoints.
// Purpose: Produce the scoped, best-effort aggregated data type list.
// Dependencies: bento-registry-core, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! Data types are aggregated from services whose service-info record marks
//! them as data services. Scope parameters (`project`, `dataset`) are
//! forwarded verbatim and partition the cache together with the caller's
//! credential digest. Cache entries remember how many data services fed
//! them; when that count drifts from the current topology the cache is
//! discarded wholesale. Malformed individual entries are dropped with a
//! log line while their well-formed siblings survive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bento_registry_core::AuthzContext;
use bento_registry_core::DataTypeRecord;
use bento_registry_core::ServiceInfoRecord;
use bento_registry_core::ServiceKind;
use tokio::task::JoinSet;

use crate::cache::TtlCache;
use crate::client::HttpClientContext;
use crate::client::join_endpoint;
use crate::client::normalize_base_url;
use crate::flight::FlightGroup;
use crate::services::ServiceAggregator;

// ============================================================================
// SECTION: Scope
// ============================================================================

/// Optional project/dataset scoping forwarded to data services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataTypeScope {
    /// Project identifier to scope counts and listings to.
    pub project: Option<String>,
    /// Dataset identifier to scope counts and listings to.
    pub dataset: Option<String>,
}

impl DataTypeScope {
    /// Renders the scope as downstream query parameters.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(project) = &self.project {
            params.push(("project".to_string(), project.clone()));
        }
        if let Some(dataset) = &self.dataset {
            params.push(("dataset".to_string(), dataset.clone()));
        }
        params
    }
}

/// Cache and coalescing key: scope plus credential digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DataTypeKey {
    /// Scope the round was fetched under.
    scope: DataTypeScope,
    /// Credential digest partitioning the entry.
    digest: String,
}

/// Cached round with the topology it was fetched against.
#[derive(Debug, Clone)]
struct CachedDataTypes {
    /// Number of data services that fed this round.
    provider_count: usize,
    /// Aggregated records in service order.
    records: Vec<DataTypeRecord>,
}

/// Outcome of one data-type fan-out round.
#[derive(Debug, Clone)]
struct DataTypeRound {
    /// Aggregated records in service order.
    records: Vec<DataTypeRecord>,
    /// Whether every data service answered.
    complete: bool,
}

// ============================================================================
// SECTION: Data Type Aggregator
// ============================================================================

/// Aggregates data type records across the node's data services.
///
/// # Invariants
/// - Only complete rounds are cached.
/// - A cache entry built against a different data-service count is stale.
#[derive(Debug)]
pub struct DataTypeAggregator {
    /// Shared HTTP context for downstream calls.
    client: HttpClientContext,
    /// Source of the aggregated service list.
    services: Arc<ServiceAggregator>,
    /// Complete rounds keyed by scope and credential digest.
    cache: TtlCache<DataTypeKey, CachedDataTypes>,
    /// Coalesces concurrent rounds per key.
    flight: FlightGroup<DataTypeKey, DataTypeRound>,
}

impl DataTypeAggregator {
    /// Creates an aggregator with the given round cache TTL.
    #[must_use]
    pub fn new(client: HttpClientContext, services: Arc<ServiceAggregator>, ttl: Duration) -> Self {
        Self {
            client,
            services,
            cache: TtlCache::new(ttl),
            flight: FlightGroup::new(),
        }
    }

    /// Returns the aggregated data type list for the caller and scope.
    pub async fn get_data_types(
        &self,
        authz: &AuthzContext,
        scope: &DataTypeScope,
    ) -> Vec<DataTypeRecord> {
        let providers = self.data_services(authz).await;
        let key = DataTypeKey {
            scope: scope.clone(),
            digest: authz.digest(),
        };
        if let Some(cached) = self.cache.get(&key) {
            if cached.provider_count == providers.len() {
                return cached.records;
            }
            tracing::info!(
                cached = cached.provider_count,
                current = providers.len(),
                "data-service topology changed; discarding data type cache"
            );
            self.cache.clear();
        }
        self.cache.sweep_expired();
        let round = self
            .flight
            .run(key.clone(), || self.fetch_round(authz, scope, &providers))
            .await;
        if round.complete {
            self.cache.insert(
                key,
                CachedDataTypes {
                    provider_count: providers.len(),
                    records: round.records.clone(),
                },
            );
        }
        round.records
    }

    /// Looks up one data type by ID in the unscoped aggregate.
    pub async fn find_data_type(
        &self,
        authz: &AuthzContext,
        id: &str,
    ) -> Option<DataTypeRecord> {
        self.get_data_types(authz, &DataTypeScope::default())
            .await
            .into_iter()
            .find(|record| record.id == id)
    }

    /// Lists the current data services as `(kind, base URL)` pairs.
    async fn data_services(&self, authz: &AuthzContext) -> Vec<(ServiceKind, String)> {
        self.services
            .get_services(authz)
            .await
            .into_iter()
            .filter_map(service_endpoint)
            .collect()
    }

    /// Runs one fan-out round over the given data services.
    async fn fetch_round(
        &self,
        authz: &AuthzContext,
        scope: &DataTypeScope,
        providers: &[(ServiceKind, String)],
    ) -> DataTypeRound {
        let deadline = self.client.round_deadline();
        let params = scope.query_params();
        let mut by_kind: BTreeMap<ServiceKind, Vec<DataTypeRecord>> = BTreeMap::new();
        let mut complete = true;

        let mut tasks: JoinSet<(ServiceKind, Option<Vec<DataTypeRecord>>)> = JoinSet::new();
        for (kind, base_url) in providers {
            let client = self.client.clone();
            let authz = authz.clone();
            let params = params.clone();
            let kind = kind.clone();
            let base_url = base_url.clone();
            tasks.spawn(async move {
                let records = fetch_service(&client, &authz, &kind, &base_url, &params, deadline).await;
                (kind, records)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Some(records))) => {
                    by_kind.insert(kind, records);
                }
                Ok((_, None)) => {
                    complete = false;
                }
                Err(err) => {
                    tracing::error!(error = %err, "data type fan-out task failed");
                    complete = false;
                }
            }
        }

        DataTypeRound {
            records: by_kind.into_values().flatten().collect(),
            complete,
        }
    }
}

/// Extracts the contact endpoint of a data-service record.
fn service_endpoint(record: ServiceInfoRecord) -> Option<(ServiceKind, String)> {
    if !record.is_data_service() {
        return None;
    }
    let kind = record.kind();
    match record.url {
        Some(url) => Some((kind, url)),
        None => {
            tracing::warn!(kind = %kind, "data service record carries no URL; skipping");
            None
        }
    }
}

/// Contacts one data service's data-types endpoint.
///
/// Malformed individual entries are dropped; an unreachable service or a
/// non-array body fails the whole service.
async fn fetch_service(
    client: &HttpClientContext,
    authz: &AuthzContext,
    kind: &ServiceKind,
    base_url: &str,
    params: &[(String, String)],
    deadline: tokio::time::Instant,
) -> Option<Vec<DataTypeRecord>> {
    let url = match join_endpoint(base_url, "data-types") {
        Some(url) => url,
        None => {
            tracing::error!(kind = %kind, base_url, "unusable service base URL");
            return None;
        }
    };
    let value = client.get_json(authz, &url, params, deadline).await?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            tracing::error!(kind = %kind, url, body = %other, "data-types response is not an array");
            return None;
        }
    };
    let base = normalize_base_url(base_url);
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<DataTypeRecord>(item) {
            Ok(mut record) => {
                record.service_base_url = base.clone();
                records.push(record);
            }
            Err(err) => {
                tracing::error!(kind = %kind, url, error = %err, "dropping malformed data type entry");
            }
        }
    }
    Some(records)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
