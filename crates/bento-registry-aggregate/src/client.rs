// crates/bento-registry-aggregate/src/client.rs
// ============================================================================
// Module: HTTP Client Context
// Description: Shared pooled HTTP client for downstream contact.
// Purpose: Bound every downstream request with timeout and TLS policy.
// Dependencies: reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! One pooled [`reqwest::Client`] is created at startup and shared for the
//! process lifetime. TLS verification may only be disabled in debug mode
//! (enforced by config validation). [`HttpClientContext::get_json`] performs
//! one bounded downstream GET and folds every failure mode (timeout,
//! connection error, non-2xx, wrong content type, invalid JSON) into a
//! logged `None`, so aggregation rounds never fail outright.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use bento_registry_core::AuthzContext;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing the shared HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Client Context
// ============================================================================

/// Shared, pooled HTTP client with the node's timeout and TLS policy.
///
/// # Invariants
/// - Cloning shares the underlying connection pool.
/// - TLS verification is only ever disabled in debug mode.
#[derive(Debug, Clone)]
pub struct HttpClientContext {
    /// Pooled async HTTP client.
    client: Client,
    /// Per-request (and per-round) timeout.
    timeout: Duration,
}

impl HttpClientContext {
    /// Creates a new client context.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the HTTP client cannot be created.
    pub fn new(timeout: Duration, validate_ssl: bool) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(format!("bento-service-registry/{}", env!("CARGO_PKG_VERSION")));
        if !validate_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            client,
            timeout,
        })
    }

    /// Returns the configured downstream timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the deadline for a fan-out round starting now.
    #[must_use]
    pub fn round_deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    /// Performs one bounded downstream GET, returning the parsed JSON body.
    ///
    /// Forwards the caller's credential when present. Every failure mode is
    /// logged and collapses to `None`; the caller excludes that service from
    /// the aggregate and marks the round incomplete.
    pub async fn get_json(
        &self,
        authz: &AuthzContext,
        url: &str,
        query: &[(String, String)],
        deadline: Instant,
    ) -> Option<Value> {
        let started = Instant::now();
        tracing::info!(url, with_token = authz.is_present(), "contacting downstream service");
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(header) = authz.header() {
            request = request.header(AUTHORIZATION, header);
        }
        let response = match tokio::time::timeout_at(deadline, request.send()).await {
            Err(_) => {
                tracing::error!(url, "timeout contacting downstream service");
                return None;
            }
            Ok(Err(err)) => {
                tracing::error!(url, error = %err, "connection error contacting downstream service");
                return None;
            }
            Ok(Ok(response)) => response,
        };
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = match tokio::time::timeout_at(deadline, response.text()).await {
            Err(_) => {
                tracing::error!(url, "timeout reading downstream response body");
                return None;
            }
            Ok(Err(err)) => {
                tracing::error!(url, error = %err, "failed to read downstream response body");
                return None;
            }
            Ok(Ok(body)) => body,
        };
        if !status.is_success() {
            tracing::error!(url, status = status.as_u16(), body = %body, "non-2xx from downstream service");
            // The proxy's "invalid jwt" rejection means the forwarded
            // credential is already invalid, so it is safe to log for
            // debugging.
            if body.contains("invalid jwt") {
                tracing::error!(
                    url,
                    header = authz.header().unwrap_or_default(),
                    "auth error from downstream; forwarded credential was rejected"
                );
            }
            return None;
        }
        if !content_type.contains("json") {
            tracing::error!(url, content_type = %content_type, "downstream response is not JSON-typed");
            return None;
        }
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                tracing::debug!(url, elapsed_secs = started.elapsed().as_secs_f64(), "downstream response ok");
                Some(value)
            }
            Err(err) => {
                tracing::error!(url, error = %err, body = %body, "invalid JSON from downstream service");
                None
            }
        }
    }
}

// ============================================================================
// SECTION: URL Helpers
// ============================================================================

/// Joins a service base URL with a discovery endpoint path.
///
/// The base is normalized to a trailing slash first so the endpoint extends
/// rather than replaces the final path segment.
pub(crate) fn join_endpoint(base: &str, endpoint: &str) -> Option<String> {
    let normalized = format!("{}/", base.trim_end_matches('/'));
    let joined = Url::parse(&normalized).ok()?.join(endpoint).ok()?;
    Some(joined.to_string())
}

/// Normalizes a service base URL to a trailing slash.
pub(crate) fn normalize_base_url(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
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

    use super::join_endpoint;
    use super::normalize_base_url;

    #[test]
    fn join_endpoint_extends_final_path_segment() {
        assert_eq!(
            join_endpoint("https://node.local/api/metadata", "service-info").unwrap(),
            "https://node.local/api/metadata/service-info"
        );
        assert_eq!(
            join_endpoint("https://node.local/api/metadata/", "data-types").unwrap(),
            "https://node.local/api/metadata/data-types"
        );
    }

    #[test]
    fn join_endpoint_rejects_unparseable_base() {
        assert!(join_endpoint("not a url", "service-info").is_none());
    }

    #[test]
    fn normalize_base_url_is_idempotent() {
        assert_eq!(normalize_base_url("https://a/b"), "https://a/b/");
        assert_eq!(normalize_base_url("https://a/b/"), "https://a/b/");
    }
}
