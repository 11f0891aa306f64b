// crates/bento-registry-server/tests/api.rs
// ============================================================================
// Module: API Integration Tests
// Description: End-to-end HTTP tests over an ephemeral-port server.
// Purpose: Verify every endpoint's status codes and JSON shapes.
// ============================================================================

//! ## Overview
//! Boots the full router over real application state on an ephemeral port,
//! with one mock downstream service served by `tiny_http`, and exercises
//! every endpoint through `reqwest`: registry views, aggregation views,
//! detail lookups, and 404 shapes.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::thread;

use bento_registry_config::RegistryConfig;
use bento_registry_server::RegistryState;
use bento_registry_server::router;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Serves a Bento-like data service on an ephemeral port; returns its base
/// URL. The server thread runs for the remainder of the test process.
fn spawn_mock_service() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let url = request.url().to_string();
            let body = if url.contains("service-info") {
                json!({
                    "id": "org.test.mock",
                    "name": "Mock Service",
                    "type": {"group": "org.test", "artifact": "mock", "version": "1.0.0"},
                    "version": "1.0.0",
                    "bento": {"serviceKind": "mock", "dataService": true},
                })
                .to_string()
            } else if url.contains("data-types") {
                json!([
                    {
                        "id": "phenopacket",
                        "queryable": true,
                        "schema": {"type": "object"},
                        "metadata_schema": {"type": "object"},
                    },
                ])
                .to_string()
            } else if url.contains("workflows") {
                json!({
                    "ingestion": {"ingest_wf": {"name": "Ingest", "file": "ingest.wdl"}},
                })
                .to_string()
            } else {
                let _ = request.respond(Response::from_string("not found").with_status_code(404));
                continue;
            };
            let response = Response::from_string(body).with_header(
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
            );
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}/api/mock")
}

/// Boots the full API on an ephemeral port; returns its base URL.
async fn spawn_api(dir: &tempfile::TempDir, service_base: &str) -> String {
    let manifest = json!({
        "mock": {
            "url_template": service_base,
            "repository": "https://example.org/repo",
            "service_kind": "mock",
            "data_service": true,
        },
    })
    .to_string();
    spawn_api_with_manifest(dir, &manifest).await
}

/// Boots the full API over an arbitrary manifest; returns its base URL.
async fn spawn_api_with_manifest(dir: &tempfile::TempDir, manifest: &str) -> String {
    let manifest_path = dir.path().join("bento_services.json");
    std::fs::write(&manifest_path, manifest).unwrap();
    let config = RegistryConfig::from_toml(&format!(
        r#"
        [node]
        bento_url = "http://127.0.0.1:5000"
        bento_public_url = "http://127.0.0.1:5000"
        bento_portal_public_url = "http://127.0.0.1:5000"

        [manifest]
        path = "{}"

        [contact]
        timeout_ms = 2000
        "#,
        manifest_path.display()
    ))
    .unwrap();
    let state = RegistryState::from_config(&config).unwrap();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Fetches a URL, returning its status and parsed JSON body.
async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

// ============================================================================
// SECTION: Registry Endpoints
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn service_info_and_manifest_views() {
    let service_base = spawn_mock_service();
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(&dir, &service_base).await;

    let (status, body) = get_json(&format!("{api}/service-info")).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "ca.c3g.bento:service-registry");
    assert_eq!(body["type"]["artifact"], "service-registry");
    assert_eq!(body["environment"], "prod");

    let (status, body) = get_json(&format!("{api}/bento-services")).await;
    assert_eq!(status, 200);
    assert_eq!(body["mock"]["url"], service_base);
    assert_eq!(body["mock"]["service_kind"], "mock");

    // The legacy alias serves the identical mapping.
    let (status, alias_body) = get_json(&format!("{api}/chord-services")).await;
    assert_eq!(status, 200);
    assert_eq!(alias_body, body);
}

// ============================================================================
// SECTION: Aggregation Endpoints
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn services_listing_types_and_detail() {
    let service_base = spawn_mock_service();
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(&dir, &service_base).await;

    let (status, body) = get_json(&format!("{api}/services")).await;
    assert_eq!(status, 200);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], "org.test.mock");
    assert_eq!(listed[0]["url"], service_base);

    let (status, body) = get_json(&format!("{api}/services/types")).await;
    assert_eq!(status, 200);
    let types = body.as_array().unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0]["group"], "org.test");
    assert_eq!(types[0]["artifact"], "mock");

    let (status, body) = get_json(&format!("{api}/services/org.test.mock")).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "org.test.mock");

    let (status, body) = get_json(&format!("{api}/services/no.such.service")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], 404);
    assert!(body["message"].as_str().unwrap().contains("no.such.service"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn self_only_manifest_serves_without_network() {
    // The registry's own kind with an unroutable URL: every view must still
    // answer from the local record, with no downstream contact.
    let manifest = json!({
        "service-registry": {
            "url_template": "http://192.0.2.1:9/api/service-registry",
            "repository": "https://example.org/repo",
            "service_kind": "service-registry",
        },
    })
    .to_string();
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api_with_manifest(&dir, &manifest).await;

    let (status, body) = get_json(&format!("{api}/bento-services")).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_object().unwrap().len(), 1);

    let (_, own) = get_json(&format!("{api}/service-info")).await;
    let (status, body) = get_json(&format!("{api}/services")).await;
    assert_eq!(status, 200);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], own["id"]);
    assert_eq!(listed[0]["url"], "http://192.0.2.1:9/api/service-registry");

    let (status, body) = get_json(&format!("{api}/services/types")).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["artifact"], "service-registry");

    let (status, body) = get_json(&format!("{api}/data-types")).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    let (status, body) = get_json(&format!("{api}/workflows")).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn data_types_and_workflows() {
    let service_base = spawn_mock_service();
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(&dir, &service_base).await;

    let (status, body) = get_json(&format!("{api}/data-types")).await;
    assert_eq!(status, 200);
    let data_types = body.as_array().unwrap();
    assert_eq!(data_types.len(), 1);
    assert_eq!(data_types[0]["id"], "phenopacket");
    assert_eq!(data_types[0]["service_base_url"], format!("{service_base}/"));

    let (status, body) = get_json(&format!("{api}/data-types/phenopacket")).await;
    assert_eq!(status, 200);
    assert_eq!(body["queryable"], true);

    let (status, body) = get_json(&format!("{api}/data-types/missing")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], 404);

    let (status, body) = get_json(&format!("{api}/workflows")).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["ingestion"]["ingest_wf"]["service_base_url"],
        format!("{service_base}/")
    );
}
