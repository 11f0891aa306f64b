// crates/bento-registry-core/src/records.rs
// ============================================================================
// Module: Aggregated Records
// Description: Record shapes for aggregated downstream responses.
// Purpose: Validate untyped downstream payloads at the aggregation boundary.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Downstream services report heterogeneous, partially-invalid payloads.
//! These types are the validation boundary: a payload either deserializes
//! into the record shape (unknown fields preserved via flattening) or the
//! record is dropped by the aggregator. Records carry the resolved service
//! URL injected by this registry, never trusted from the payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::identifiers::ServiceId;
use crate::identifiers::ServiceKind;

// ============================================================================
// SECTION: Service Info
// ============================================================================

/// Structured GA4GH service type (group/artifact/version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    /// Reverse-domain group, e.g. `ca.c3g.bento`.
    pub group: String,
    /// Service artifact, e.g. `service-registry`.
    pub artifact: String,
    /// Artifact version.
    pub version: String,
}

impl ServiceType {
    /// Returns the joined `group:artifact:version` deduplication key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Bento-specific metadata block nested in a service-info document.
///
/// # Invariants
/// - Unknown block fields survive a round trip via `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BentoInfoBlock {
    /// Stable service kind the service reports for itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_kind: Option<ServiceKind>,
    /// Whether the service exposes `/data-types`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_service: Option<bool>,
    /// Whether the service provides `/workflows` without being a data service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_provider: Option<bool>,
    /// Current git tag (dev mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_tag: Option<String>,
    /// Current git branch (dev mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Current git commit hash (dev mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    /// Unknown block fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BentoInfoBlock {
    /// Returns true when the service reports itself as a data service.
    #[must_use]
    pub fn is_data_service(&self) -> bool {
        self.data_service.unwrap_or(false)
    }

    /// Returns true when the service reports itself as a workflow provider.
    #[must_use]
    pub fn is_workflow_provider(&self) -> bool {
        self.workflow_provider.unwrap_or(false)
    }
}

/// Aggregated, normalized result of one service's `/service-info`.
///
/// # Invariants
/// - `id` is unique across the aggregated set for one node.
/// - `url` is the registry-resolved base URL, injected during aggregation.
/// - Unknown payload fields survive a round trip via `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfoRecord {
    /// Runtime-assigned service identifier.
    pub id: ServiceId,
    /// Human-readable service name.
    pub name: String,
    /// Structured service type.
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Organization block (opaque).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Value>,
    /// Contact URL (usually a `mailto:`).
    #[serde(rename = "contactUrl", skip_serializing_if = "Option::is_none")]
    pub contact_url: Option<String>,
    /// Service version.
    pub version: String,
    /// Deployment environment, `prod` or `dev`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Bento-specific metadata block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bento: Option<BentoInfoBlock>,
    /// Registry-resolved base URL for the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unknown payload fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceInfoRecord {
    /// Returns the stable service kind, preferring the bento block over the
    /// type artifact.
    #[must_use]
    pub fn kind(&self) -> ServiceKind {
        self.bento
            .as_ref()
            .and_then(|bento| bento.service_kind.clone())
            .unwrap_or_else(|| ServiceKind::new(self.service_type.artifact.clone()))
    }

    /// Returns true when the service reports itself as a data service.
    #[must_use]
    pub fn is_data_service(&self) -> bool {
        self.bento.as_ref().is_some_and(BentoInfoBlock::is_data_service)
    }

    /// Returns true when the service provides workflows (data services count).
    #[must_use]
    pub fn is_workflow_provider(&self) -> bool {
        self.bento
            .as_ref()
            .is_some_and(|bento| bento.is_data_service() || bento.is_workflow_provider())
    }
}

// ============================================================================
// SECTION: Data Types
// ============================================================================

/// One data type reported by a data service.
///
/// # Invariants
/// - `count` is permission-scoped: cached aggregates containing it must be
///   partitioned by credential digest.
/// - `service_base_url` is injected by the registry, never trusted from the
///   payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTypeRecord {
    /// Data type identifier, unique across the aggregated union.
    pub id: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether the data type supports queries.
    pub queryable: bool,
    /// Opaque item schema; `schema` on the wire.
    #[serde(rename = "schema")]
    pub item_schema: Value,
    /// Opaque metadata schema.
    pub metadata_schema: Value,
    /// Entity count; nullable and permission-scoped.
    pub count: Option<i64>,
    /// Last ingestion timestamp, as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ingested: Option<String>,
    /// Base URL of the reporting service, injected by the registry.
    #[serde(default)]
    pub service_base_url: String,
}

// ============================================================================
// SECTION: Workflows
// ============================================================================

/// Aggregated workflows: purpose tag, then workflow id, then opaque
/// definition annotated with `service_base_url`.
pub type WorkflowsByPurpose = BTreeMap<String, BTreeMap<String, Value>>;

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

    use serde_json::json;

    use super::DataTypeRecord;
    use super::ServiceInfoRecord;

    #[test]
    fn service_info_roundtrip_preserves_unknown_fields() {
        let payload = json!({
            "id": "node1:metadata",
            "name": "Katsu",
            "type": {"group": "ca.c3g.bento", "artifact": "metadata", "version": "3.0.0"},
            "version": "3.0.0",
            "environment": "prod",
            "bento": {"serviceKind": "metadata", "dataService": true},
            "documentationUrl": "https://example.org/docs"
        });
        let record: ServiceInfoRecord = serde_json::from_value(payload.clone()).unwrap();
        assert!(record.is_data_service());
        assert_eq!(record.kind().as_str(), "metadata");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back.get("documentationUrl"), payload.get("documentationUrl"));
        assert_eq!(back.get("type"), payload.get("type"));
    }

    #[test]
    fn bento_block_roundtrip_preserves_unknown_fields() {
        let payload = json!({
            "id": "node1:metadata",
            "name": "Katsu",
            "type": {"group": "ca.c3g.bento", "artifact": "metadata", "version": "3.0.0"},
            "version": "3.0.0",
            "bento": {
                "serviceKind": "metadata",
                "dataService": true,
                "gitRepository": "https://github.com/bento-platform/katsu"
            }
        });
        let record: ServiceInfoRecord = serde_json::from_value(payload.clone()).unwrap();
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(
            back["bento"].get("gitRepository"),
            payload["bento"].get("gitRepository")
        );
        assert_eq!(back["bento"]["dataService"], json!(true));
    }

    #[test]
    fn service_info_rejects_missing_required_fields() {
        let payload = json!({"name": "no id or type"});
        assert!(serde_json::from_value::<ServiceInfoRecord>(payload).is_err());
    }

    #[test]
    fn kind_falls_back_to_type_artifact() {
        let payload = json!({
            "id": "node1:drop-box",
            "name": "Drop Box",
            "type": {"group": "ca.c3g.bento", "artifact": "drop-box", "version": "1.0.0"},
            "version": "1.0.0"
        });
        let record: ServiceInfoRecord = serde_json::from_value(payload).unwrap();
        assert_eq!(record.kind().as_str(), "drop-box");
        assert!(!record.is_data_service());
    }

    #[test]
    fn data_type_accepts_null_count_and_schema_alias() {
        let payload = json!({
            "id": "phenopacket",
            "queryable": true,
            "schema": {"type": "object"},
            "metadata_schema": {"type": "object"},
            "count": null
        });
        let record: DataTypeRecord = serde_json::from_value(payload).unwrap();
        assert_eq!(record.count, None);
        let back = serde_json::to_value(&record).unwrap();
        assert!(back.get("schema").is_some());
        assert!(back.get("item_schema").is_none());
    }

    #[test]
    fn data_type_rejects_missing_queryable() {
        let payload = json!({
            "id": "phenopacket",
            "schema": {},
            "metadata_schema": {},
            "count": 5
        });
        assert!(serde_json::from_value::<DataTypeRecord>(payload).is_err());
    }
}
