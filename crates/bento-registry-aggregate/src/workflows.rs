// crates/bento-registry-aggregate/src/workflows.rs
// ============================================================================
// Module: Workflow Aggregation
// Description: Fans out to workflow providers' workflows endpoints.
// Purpose: Produce the merged purpose-keyed workflow mapping.
// Dependencies: bento-registry-core, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! Workflows are aggregated from services whose service-info record marks
//! them as data services or workflow providers. Each provider returns a
//! purpose-keyed mapping of workflow definitions; rounds merge these per
//! purpose in service order, stamping each definition with the providing
//! service's base URL so runners know where to fetch workflow files.
//! Cache entries remember the provider count that fed them and are evicted
//! when the topology drifts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bento_registry_core::AuthzContext;
use bento_registry_core::ServiceInfoRecord;
use bento_registry_core::ServiceKind;
use bento_registry_core::WorkflowsByPurpose;
use serde_json::Value;
use tokio::task::JoinSet;

use crate::cache::TtlCache;
use crate::client::HttpClientContext;
use crate::client::join_endpoint;
use crate::client::normalize_base_url;
use crate::flight::FlightGroup;
use crate::services::ServiceAggregator;

// ============================================================================
// SECTION: Round Types
// ============================================================================

/// Cached round with the topology it was fetched against.
#[derive(Debug, Clone)]
struct CachedWorkflows {
    /// Number of workflow providers that fed this round.
    provider_count: usize,
    /// Merged purpose-keyed workflow mapping.
    workflows: WorkflowsByPurpose,
}

/// Outcome of one workflow fan-out round.
#[derive(Debug, Clone)]
struct WorkflowRound {
    /// Merged purpose-keyed workflow mapping.
    workflows: WorkflowsByPurpose,
    /// Whether every provider answered.
    complete: bool,
}

// ============================================================================
// SECTION: Workflow Aggregator
// ============================================================================

/// Aggregates workflow definitions across the node's workflow providers.
///
/// # Invariants
/// - Only complete rounds are cached.
/// - An entry built against a different provider count is evicted.
#[derive(Debug)]
pub struct WorkflowAggregator {
    /// Shared HTTP context for downstream calls.
    client: HttpClientContext,
    /// Source of the aggregated service list.
    services: Arc<ServiceAggregator>,
    /// Complete rounds keyed by credential digest.
    cache: TtlCache<String, CachedWorkflows>,
    /// Coalesces concurrent rounds per credential digest.
    flight: FlightGroup<String, WorkflowRound>,
}

impl WorkflowAggregator {
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

    /// Returns the merged workflow mapping for the caller's credential.
    pub async fn get_workflows(&self, authz: &AuthzContext) -> WorkflowsByPurpose {
        let providers = self.workflow_providers(authz).await;
        let digest = authz.digest();
        if let Some(cached) = self.cache.get(&digest) {
            if cached.provider_count == providers.len() {
                return cached.workflows;
            }
            tracing::info!(
                cached = cached.provider_count,
                current = providers.len(),
                "workflow provider topology changed; evicting cached round"
            );
            self.cache.remove(&digest);
        }
        let round = self
            .flight
            .run(digest.clone(), || self.fetch_round(authz, &providers))
            .await;
        if round.complete {
            self.cache.insert(
                digest,
                CachedWorkflows {
                    provider_count: providers.len(),
                    workflows: round.workflows.clone(),
                },
            );
        }
        self.cache.sweep_expired();
        round.workflows
    }

    /// Lists the current workflow providers as `(kind, base URL)` pairs.
    async fn workflow_providers(&self, authz: &AuthzContext) -> Vec<(ServiceKind, String)> {
        self.services
            .get_services(authz)
            .await
            .into_iter()
            .filter_map(provider_endpoint)
            .collect()
    }

    /// Runs one fan-out round over the given providers.
    async fn fetch_round(
        &self,
        authz: &AuthzContext,
        providers: &[(ServiceKind, String)],
    ) -> WorkflowRound {
        let deadline = self.client.round_deadline();
        let mut by_kind: BTreeMap<ServiceKind, WorkflowsByPurpose> = BTreeMap::new();
        let mut complete = true;

        let mut tasks: JoinSet<(ServiceKind, Option<WorkflowsByPurpose>)> = JoinSet::new();
        for (kind, base_url) in providers {
            let client = self.client.clone();
            let authz = authz.clone();
            let kind = kind.clone();
            let base_url = base_url.clone();
            tasks.spawn(async move {
                let workflows = fetch_provider(&client, &authz, &kind, &base_url, deadline).await;
                (kind, workflows)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Some(workflows))) => {
                    by_kind.insert(kind, workflows);
                }
                Ok((_, None)) => {
                    complete = false;
                }
                Err(err) => {
                    tracing::error!(error = %err, "workflow fan-out task failed");
                    complete = false;
                }
            }
        }

        let mut merged = WorkflowsByPurpose::new();
        for provider_workflows in by_kind.into_values() {
            for (purpose, definitions) in provider_workflows {
                merged.entry(purpose).or_default().extend(definitions);
            }
        }

        WorkflowRound {
            workflows: merged,
            complete,
        }
    }
}

/// Extracts the contact endpoint of a workflow-provider record.
fn provider_endpoint(record: ServiceInfoRecord) -> Option<(ServiceKind, String)> {
    if !record.is_workflow_provider() {
        return None;
    }
    let kind = record.kind();
    match record.url {
        Some(url) => Some((kind, url)),
        None => {
            tracing::warn!(kind = %kind, "workflow provider record carries no URL; skipping");
            None
        }
    }
}

/// Contacts one provider's workflows endpoint.
///
/// The body must be an object mapping purposes to named workflow objects;
/// each workflow definition is stamped with the provider's base URL.
async fn fetch_provider(
    client: &HttpClientContext,
    authz: &AuthzContext,
    kind: &ServiceKind,
    base_url: &str,
    deadline: tokio::time::Instant,
) -> Option<WorkflowsByPurpose> {
    let url = match join_endpoint(base_url, "workflows") {
        Some(url) => url,
        None => {
            tracing::error!(kind = %kind, base_url, "unusable service base URL");
            return None;
        }
    };
    let value = client.get_json(authz, &url, &[], deadline).await?;
    let purposes = match value {
        Value::Object(purposes) => purposes,
        other => {
            tracing::error!(kind = %kind, url, body = %other, "workflows response is not an object");
            return None;
        }
    };
    let base = normalize_base_url(base_url);
    let mut workflows = WorkflowsByPurpose::new();
    for (purpose, named) in purposes {
        let named = match named {
            Value::Object(named) => named,
            other => {
                tracing::error!(
                    kind = %kind,
                    url,
                    purpose,
                    body = %other,
                    "dropping malformed workflow purpose entry"
                );
                continue;
            }
        };
        let slot = workflows.entry(purpose).or_default();
        for (name, mut definition) in named {
            if let Value::Object(fields) = &mut definition {
                fields.insert(
                    "service_base_url".to_string(),
                    Value::String(base.clone()),
                );
            }
            slot.insert(name, definition);
        }
    }
    Some(workflows)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
