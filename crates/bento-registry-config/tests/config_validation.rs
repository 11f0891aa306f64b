// crates/bento-registry-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Range and shape validation for registry configuration.
// Purpose: Ensure invalid configuration fails startup closed.
// Dependencies: bento-registry-config, tempfile
// ============================================================================

//! ## Overview
//! Exercises TOML parsing, defaults, and fail-closed validation for the
//! registry configuration model.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::io::Write;

use bento_registry_config::ConfigError;
use bento_registry_config::RegistryConfig;

/// Minimal valid configuration text.
fn minimal_toml() -> String {
    r#"
        [node]
        bento_url = "https://bentov2.local/"
        bento_public_url = "https://public.bentov2.local/"
        bento_portal_public_url = "https://portal.bentov2.local/"

        [manifest]
        path = "bento_services.json"
    "#
    .to_string()
}

#[test]
fn minimal_config_parses_with_defaults() {
    let config = RegistryConfig::from_toml(&minimal_toml()).unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:5000");
    assert_eq!(config.identity.service_id, "ca.c3g.bento:service-registry");
    assert_eq!(config.contact.timeout_ms, 5_000);
    assert!(config.contact.validate_ssl);
    assert!(!config.contact.debug);
    assert_eq!(config.cache.service_ttl_secs, 30);
    assert_eq!(config.cache.data_type_ttl_secs, 3_600);
    assert_eq!(config.cache.workflow_ttl_secs, 3_600);
    assert_eq!(config.log.level, "info");
}

#[test]
fn rejects_invalid_bind_address() {
    let text = format!("{}\n[server]\nbind = \"not-an-addr\"\n", minimal_toml());
    let err = RegistryConfig::from_toml(&text).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn rejects_invalid_node_url() {
    let text = minimal_toml().replace("https://public.bentov2.local/", "not a url");
    let err = RegistryConfig::from_toml(&text).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn rejects_out_of_range_timeout() {
    let text = format!("{}\n[contact]\ntimeout_ms = 1\nvalidate_ssl = true\ndebug = false\n", minimal_toml());
    let err = RegistryConfig::from_toml(&text).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn rejects_tls_bypass_outside_debug() {
    let text = format!(
        "{}\n[contact]\ntimeout_ms = 5000\nvalidate_ssl = false\ndebug = false\n",
        minimal_toml()
    );
    let err = RegistryConfig::from_toml(&text).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn accepts_tls_bypass_in_debug() {
    let text = format!(
        "{}\n[contact]\ntimeout_ms = 5000\nvalidate_ssl = false\ndebug = true\n",
        minimal_toml()
    );
    let config = RegistryConfig::from_toml(&text).unwrap();
    assert!(config.contact.debug);
    assert!(!config.contact.validate_ssl);
}

#[test]
fn rejects_malformed_toml() {
    let err = RegistryConfig::from_toml("this is not toml = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn load_reads_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(minimal_toml().as_bytes()).unwrap();
    let config = RegistryConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.manifest.path.to_string_lossy(), "bento_services.json");
}

#[test]
fn load_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = RegistryConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::Read(_)));
}
