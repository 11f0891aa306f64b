// crates/bento-registry-core/src/authz.rs
// ============================================================================
// Module: Authorization Context
// Description: Forwarded credential and cache-partitioning digest.
// Purpose: Carry the caller's opaque credential and hash it for cache keys.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! The registry never makes authorization decisions; it forwards the inbound
//! `Authorization` header to downstream services unmodified and uses a
//! one-way digest of it to partition permission-sensitive caches (data-type
//! counts, workflows). The digest is SHA-256: a fast general-purpose hash
//! would allow collision construction, letting one caller read another
//! caller's cached, differently-scoped aggregates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Authorization Context
// ============================================================================

/// Optional forwarded credential extracted from an inbound request.
///
/// # Invariants
/// - The header value is opaque and forwarded byte-for-byte.
/// - `digest()` is stable for equal credentials and for absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthzContext {
    /// Raw `Authorization` header value, when present.
    header: Option<String>,
}

impl AuthzContext {
    /// Creates a context from an optional raw header value.
    #[must_use]
    pub const fn new(header: Option<String>) -> Self {
        Self {
            header,
        }
    }

    /// Creates a context for an unauthenticated caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            header: None,
        }
    }

    /// Returns the raw header value for downstream forwarding.
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Returns true when the caller presented a credential.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.header.is_some()
    }

    /// Returns the lowercase hex SHA-256 digest of the raw credential bytes
    /// (of the empty string when absent), used as a cache-partitioning key.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.header.as_deref().unwrap_or_default().as_bytes());
        hex_encode(&hasher.finalize())
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
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

    use super::AuthzContext;

    #[test]
    fn digest_is_stable_and_distinct_per_credential() {
        let alice = AuthzContext::new(Some("Bearer alice-token".to_string()));
        let bob = AuthzContext::new(Some("Bearer bob-token".to_string()));
        assert_eq!(alice.digest(), alice.digest());
        assert_ne!(alice.digest(), bob.digest());
        assert_eq!(alice.digest().len(), 64);
    }

    #[test]
    fn anonymous_digest_matches_empty_credential() {
        // SHA-256 of the empty string.
        assert_eq!(
            AuthzContext::anonymous().digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(!AuthzContext::anonymous().is_present());
    }
}
