// crates/bento-registry-server/src/routes.rs
// ============================================================================
// Module: API Routes
// Description: Axum router and handlers for the registry API.
// Purpose: Serve registry and aggregation views as JSON over GET.
// Dependencies: axum, bento-registry-aggregate, bento-registry-core
// ============================================================================

//! ## Overview
//! Every endpoint is a read-only GET returning JSON. Downstream failures
//! never surface as errors here: aggregation endpoints serve best-effort
//! collections. The only error statuses are 404 for unknown IDs and 500
//! when a service listed moments ago can no longer be re-fetched for its
//! detail view.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use bento_registry_aggregate::DataTypeScope;
use bento_registry_core::DataTypeRecord;
use bento_registry_core::ServiceInfoRecord;
use bento_registry_core::ServiceType;
use bento_registry_core::ServicesByKind;
use bento_registry_core::WorkflowsByPurpose;
use serde::Deserialize;
use serde_json::json;

use crate::authz::extract_authz;
use crate::state::RegistryState;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// API error rendered as a JSON body with a matching status code.
#[derive(Debug)]
enum ApiError {
    /// The requested resource does not exist.
    NotFound(String),
    /// The request could not be completed.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        let body = Json(json!({
            "code": status.as_u16(),
            "message": message,
        }));
        (status, body).into_response()
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the registry API router over shared state.
#[must_use]
pub fn router(state: RegistryState) -> Router {
    Router::new()
        .route("/service-info", get(service_info))
        .route("/bento-services", get(bento_services))
        .route("/chord-services", get(bento_services))
        .route("/services", get(services))
        .route("/services/types", get(service_types))
        .route("/services/{service_id}", get(service_by_id))
        .route("/data-types", get(data_types))
        .route("/data-types/{data_type_id}", get(data_type_by_id))
        .route("/workflows", get(workflows))
        .with_state(state)
}

// ============================================================================
// SECTION: Registry Handlers
// ============================================================================

/// `GET /service-info`: this node's own service-info document.
async fn service_info(State(state): State<RegistryState>) -> Json<ServiceInfoRecord> {
    Json(state.self_info.record().await)
}

/// `GET /bento-services` (alias `/chord-services`): the raw manifest
/// mapping after filtering.
async fn bento_services(State(state): State<RegistryState>) -> Json<ServicesByKind> {
    Json(state.manifest.get().await)
}

// ============================================================================
// SECTION: Aggregation Handlers
// ============================================================================

/// `GET /services`: aggregated service-info documents.
async fn services(
    State(state): State<RegistryState>,
    headers: HeaderMap,
) -> Json<Vec<ServiceInfoRecord>> {
    let authz = extract_authz(&headers);
    Json(state.services.get_services(&authz).await)
}

/// `GET /services/types`: deduplicated service types across `/services`.
async fn service_types(
    State(state): State<RegistryState>,
    headers: HeaderMap,
) -> Json<Vec<ServiceType>> {
    let authz = extract_authz(&headers);
    let mut by_key: BTreeMap<String, ServiceType> = BTreeMap::new();
    for record in state.services.get_services(&authz).await {
        by_key
            .entry(record.service_type.key())
            .or_insert(record.service_type);
    }
    Json(by_key.into_values().collect())
}

/// `GET /services/{service_id}`: one service's document by its `id`.
///
/// 404 when the ID is not among the aggregated services; 500 when the
/// service was listed but its kind can no longer be re-fetched.
async fn service_by_id(
    State(state): State<RegistryState>,
    headers: HeaderMap,
    Path(service_id): Path<String>,
) -> Result<Json<ServiceInfoRecord>, ApiError> {
    let authz = extract_authz(&headers);
    let listed = state
        .services
        .get_services(&authz)
        .await
        .into_iter()
        .find(|record| record.id.as_str() == service_id)
        .ok_or_else(|| ApiError::NotFound(format!("service not found: {service_id}")))?;
    let kind = listed.kind();
    state
        .services
        .fetch_one(&authz, &kind)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::Internal(format!("could not fetch service of kind {kind}")))
}

/// Optional project/dataset scope query parameters.
#[derive(Debug, Deserialize)]
struct ScopeQuery {
    /// Project identifier forwarded to data services.
    project: Option<String>,
    /// Dataset identifier forwarded to data services.
    dataset: Option<String>,
}

/// `GET /data-types`: aggregated data types, optionally scoped.
async fn data_types(
    State(state): State<RegistryState>,
    headers: HeaderMap,
    Query(scope): Query<ScopeQuery>,
) -> Json<Vec<DataTypeRecord>> {
    let authz = extract_authz(&headers);
    let scope = DataTypeScope {
        project: scope.project,
        dataset: scope.dataset,
    };
    Json(state.data_types.get_data_types(&authz, &scope).await)
}

/// `GET /data-types/{data_type_id}`: one data type by ID.
async fn data_type_by_id(
    State(state): State<RegistryState>,
    headers: HeaderMap,
    Path(data_type_id): Path<String>,
) -> Result<Json<DataTypeRecord>, ApiError> {
    let authz = extract_authz(&headers);
    state
        .data_types
        .find_data_type(&authz, &data_type_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("data type not found: {data_type_id}")))
}

/// `GET /workflows`: purpose-keyed workflow mapping.
async fn workflows(
    State(state): State<RegistryState>,
    headers: HeaderMap,
) -> Json<WorkflowsByPurpose> {
    let authz = extract_authz(&headers);
    Json(state.workflows.get_workflows(&authz).await)
}
