// crates/bento-registry-config/src/config.rs
// ============================================================================
// Module: Registry Configuration
// Description: Configuration model, loading, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bento-registry-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a strict size limit and
//! validated before any server state is constructed. The manifest path is
//! the only external file reference; its content errors degrade at runtime,
//! but a missing/oversized/unparseable config file aborts startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use bento_registry_core::UrlVars;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "bento-registry.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "BENTO_REGISTRY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Minimum downstream contact timeout in milliseconds.
pub(crate) const MIN_CONTACT_TIMEOUT_MS: u64 = 100;
/// Maximum downstream contact timeout in milliseconds.
pub(crate) const MAX_CONTACT_TIMEOUT_MS: u64 = 60_000;
/// Maximum cache TTL in seconds (one day).
pub(crate) const MAX_CACHE_TTL_SECS: u64 = 86_400;
/// Default downstream contact timeout in milliseconds.
const DEFAULT_CONTACT_TIMEOUT_MS: u64 = 5_000;
/// Default service-info aggregate cache TTL in seconds.
const DEFAULT_SERVICE_TTL_SECS: u64 = 30;
/// Default data-type aggregate cache TTL in seconds.
const DEFAULT_DATA_TYPE_TTL_SECS: u64 = 3_600;
/// Default workflow aggregate cache TTL in seconds.
const DEFAULT_WORKFLOW_TTL_SECS: u64 = 3_600;
/// Service type group for this registry's own identity.
pub const SERVICE_GROUP: &str = "ca.c3g.bento";
/// Service type artifact (and default service kind) for this registry.
pub const SERVICE_ARTIFACT: &str = "service-registry";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Bento service registry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Service identity configuration.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Node-level base URLs used for manifest template resolution.
    pub node: NodeConfig,
    /// Manifest file configuration.
    pub manifest: ManifestConfig,
    /// Downstream contact configuration.
    #[serde(default)]
    pub contact: ContactConfig,
    /// Aggregate cache TTLs.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the API listener.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Identity strings this registry advertises about itself.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Globally-unique service id; defaults to `group:artifact`.
    pub service_id: String,
    /// Human-readable service name.
    pub service_name: String,
    /// Human-readable service description.
    pub description: String,
    /// Contact URL advertised in service-info.
    pub contact_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            service_id: format!("{SERVICE_GROUP}:{SERVICE_ARTIFACT}"),
            service_name: "Bento Service Registry".to_string(),
            description: "Service registry for a Bento platform node.".to_string(),
            contact_url: "mailto:info@c3g.ca".to_string(),
        }
    }
}

/// Node-level base URLs available to manifest URL templates.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// The node's own (internal) base URL.
    pub bento_url: String,
    /// The node's public base URL.
    pub bento_public_url: String,
    /// The node's portal public base URL.
    pub bento_portal_public_url: String,
}

impl NodeConfig {
    /// Returns the template variables derived from this node configuration.
    #[must_use]
    pub fn url_vars(&self) -> UrlVars {
        UrlVars {
            bento_url: self.bento_url.clone(),
            bento_public_url: self.bento_public_url.clone(),
            bento_portal_public_url: self.bento_portal_public_url.clone(),
        }
    }
}

/// Manifest file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestConfig {
    /// Path to the `bento_services.json` manifest file.
    pub path: PathBuf,
}

/// Downstream contact configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Per-round downstream request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Whether downstream TLS certificates are verified.
    pub validate_ssl: bool,
    /// Debug/dev mode: enables git metadata and permits TLS bypass.
    pub debug: bool,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_CONTACT_TIMEOUT_MS,
            validate_ssl: true,
            debug: false,
        }
    }
}

/// Aggregate cache TTLs in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// TTL for the aggregated service-info round cache.
    pub service_ttl_secs: u64,
    /// TTL for the data-type aggregate cache.
    pub data_type_ttl_secs: u64,
    /// TTL for the workflow aggregate cache.
    pub workflow_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            service_ttl_secs: DEFAULT_SERVICE_TTL_SECS,
            data_type_ttl_secs: DEFAULT_DATA_TYPE_TTL_SECS,
            workflow_ttl_secs: DEFAULT_WORKFLOW_TTL_SECS,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level filter directive, e.g. `info` or `bento_registry=debug`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors; all of these abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config read failed: {0}")]
    Read(String),
    /// The config file is not valid TOML for the expected model.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// A config value is out of range or inconsistent.
    #[error("config validation failed: {0}")]
    Validation(String),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl RegistryConfig {
    /// Loads and validates configuration.
    ///
    /// The path is resolved from, in order: the explicit argument, the
    /// `BENTO_REGISTRY_CONFIG` environment variable, the default filename in
    /// the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, oversized,
    /// unparseable, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = path.map_or_else(
            || env::var(CONFIG_ENV_VAR).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from),
            Path::to_path_buf,
        );
        let metadata =
            fs::metadata(&resolved).map_err(|err| ConfigError::Read(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE as u64 {
            return Err(ConfigError::Read(format!(
                "config file {} exceeds {MAX_CONFIG_FILE_SIZE} bytes",
                resolved.display()
            )));
        }
        let text =
            fs::read_to_string(&resolved).map_err(|err| ConfigError::Read(err.to_string()))?;
        Self::from_toml(&text)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges and URL shapes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for any out-of-range or
    /// inconsistent value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Validation(format!("invalid bind address: {}", self.server.bind)))?;
        for (field, value) in [
            ("node.bento_url", &self.node.bento_url),
            ("node.bento_public_url", &self.node.bento_public_url),
            ("node.bento_portal_public_url", &self.node.bento_portal_public_url),
        ] {
            Url::parse(value)
                .map_err(|_| ConfigError::Validation(format!("{field} is not a valid URL: {value}")))?;
        }
        if self.identity.service_id.is_empty() {
            return Err(ConfigError::Validation("identity.service_id must not be empty".to_string()));
        }
        if self.identity.service_name.is_empty() {
            return Err(ConfigError::Validation("identity.service_name must not be empty".to_string()));
        }
        if !(MIN_CONTACT_TIMEOUT_MS..=MAX_CONTACT_TIMEOUT_MS).contains(&self.contact.timeout_ms) {
            return Err(ConfigError::Validation(format!(
                "contact.timeout_ms must be within [{MIN_CONTACT_TIMEOUT_MS}, {MAX_CONTACT_TIMEOUT_MS}]"
            )));
        }
        if !self.contact.validate_ssl && !self.contact.debug {
            return Err(ConfigError::Validation(
                "contact.validate_ssl may only be disabled in debug mode".to_string(),
            ));
        }
        for (field, value) in [
            ("cache.service_ttl_secs", self.cache.service_ttl_secs),
            ("cache.data_type_ttl_secs", self.cache.data_type_ttl_secs),
            ("cache.workflow_ttl_secs", self.cache.workflow_ttl_secs),
        ] {
            if value > MAX_CACHE_TTL_SECS {
                return Err(ConfigError::Validation(format!(
                    "{field} must not exceed {MAX_CACHE_TTL_SECS}"
                )));
            }
        }
        Ok(())
    }
}
