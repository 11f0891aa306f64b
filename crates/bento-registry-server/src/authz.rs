// crates/bento-registry-server/src/authz.rs
// ============================================================================
// Module: Credential Extraction
// Description: Maps inbound request headers to an authorization context.
// Purpose: Capture the forwardable credential without interpreting it.
// Dependencies: axum, bento-registry-core
// ============================================================================

//! ## Overview
//! The registry performs no authorization of its own; it captures the
//! caller's `Authorization` header verbatim so aggregation can forward it
//! downstream and partition caches by its digest. A header that is not
//! valid visible ASCII is treated as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use bento_registry_core::AuthzContext;

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Builds the authorization context from inbound request headers.
#[must_use]
pub fn extract_authz(headers: &HeaderMap) -> AuthzContext {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    AuthzContext::new(header)
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

    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;

    use super::extract_authz;

    #[test]
    fn missing_header_is_anonymous() {
        let headers = HeaderMap::new();
        let authz = extract_authz(&headers);
        assert!(!authz.is_present());
    }

    #[test]
    fn bearer_header_is_captured_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let authz = extract_authz(&headers);
        assert_eq!(authz.header(), Some("Bearer abc"));
    }

    #[test]
    fn non_ascii_header_is_treated_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff").unwrap(),
        );
        let authz = extract_authz(&headers);
        assert!(!authz.is_present());
    }
}
