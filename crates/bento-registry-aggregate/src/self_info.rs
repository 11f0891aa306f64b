// crates/bento-registry-aggregate/src/self_info.rs
// ============================================================================
// Module: Self Service Info
// Description: Builds the registry's own service-info record.
// Purpose: Answer for the registry's kind without contacting the network.
// Dependencies: async-trait, bento-registry-config, bento-registry-core,
//               serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! The registry is itself one of the node's services, so requests for its
//! own record are answered locally instead of over HTTP. The record is
//! assembled once per process from configured identity fields, the crate
//! version, and optional version-control metadata supplied by a
//! [`VersionMetadataProvider`]; debug deployments use the git provider to
//! surface tag, branch, and commit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bento_registry_config::IdentityConfig;
use bento_registry_config::SERVICE_ARTIFACT;
use bento_registry_config::SERVICE_GROUP;
use bento_registry_core::BentoInfoBlock;
use bento_registry_core::ServiceInfoRecord;
use bento_registry_core::ServiceKind;
use bento_registry_core::ServiceType;
use serde_json::Map;
use serde_json::json;
use tokio::sync::OnceCell;

// ============================================================================
// SECTION: Version Metadata
// ============================================================================

/// Version-control metadata attached to the self record in debug mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitMetadata {
    /// Most recent tag reachable from the checked-out commit.
    pub tag: Option<String>,
    /// Currently checked-out branch, if any.
    pub branch: Option<String>,
    /// Full hash of the checked-out commit.
    pub commit: Option<String>,
}

/// Source of version-control metadata for the self record.
#[async_trait]
pub trait VersionMetadataProvider: Send + Sync + std::fmt::Debug {
    /// Returns metadata for the running deployment, or `None` when
    /// unavailable.
    async fn metadata(&self) -> Option<GitMetadata>;
}

/// Provider that never reports metadata; used outside debug mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVersionMetadata;

#[async_trait]
impl VersionMetadataProvider for NoopVersionMetadata {
    async fn metadata(&self) -> Option<GitMetadata> {
        None
    }
}

/// Provider that shells out to `git` in a working directory.
///
/// Every lookup degrades independently: a missing binary, a non-repository
/// directory, or a detached head yields `None` fields rather than an error.
#[derive(Debug, Clone)]
pub struct GitVersionMetadata {
    /// Directory in which git commands run.
    workdir: PathBuf,
}

impl GitVersionMetadata {
    /// Creates a provider rooted at the given working directory.
    #[must_use]
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
        }
    }

    /// Runs a git subcommand, returning trimmed stdout on success.
    async fn git(&self, args: &[&str]) -> Option<String> {
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;
        match output {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if text.is_empty() { None } else { Some(text) }
            }
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(error = %err, "git metadata lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl VersionMetadataProvider for GitVersionMetadata {
    async fn metadata(&self) -> Option<GitMetadata> {
        let tag = self.git(&["describe", "--tags", "--abbrev=0"]).await;
        let branch = self.git(&["branch", "--show-current"]).await;
        let commit = self.git(&["rev-parse", "HEAD"]).await;
        if tag.is_none() && branch.is_none() && commit.is_none() {
            return None;
        }
        Some(GitMetadata {
            tag,
            branch,
            commit,
        })
    }
}

// ============================================================================
// SECTION: Self Info Provider
// ============================================================================

/// Builds and memoizes the registry's own service-info record.
#[derive(Debug)]
pub struct SelfInfoProvider {
    /// Configured identity fields.
    identity: IdentityConfig,
    /// Service kind the registry answers for locally.
    kind: ServiceKind,
    /// Whether the deployment runs in debug mode.
    debug: bool,
    /// Version metadata source.
    metadata: Arc<dyn VersionMetadataProvider>,
    /// Memoized record; built once per process.
    cached: OnceCell<ServiceInfoRecord>,
}

impl SelfInfoProvider {
    /// Service kind under which the registry registers itself.
    pub const KIND: &'static str = "service-registry";

    /// Creates a provider from configured identity and mode.
    #[must_use]
    pub fn new(
        identity: IdentityConfig,
        debug: bool,
        metadata: Arc<dyn VersionMetadataProvider>,
    ) -> Self {
        Self {
            identity,
            kind: ServiceKind::new(Self::KIND),
            debug,
            metadata,
            cached: OnceCell::new(),
        }
    }

    /// Returns the registry's own service kind.
    #[must_use]
    pub fn kind(&self) -> &ServiceKind {
        &self.kind
    }

    /// Returns the self record, building it on first use.
    pub async fn record(&self) -> ServiceInfoRecord {
        self.cached.get_or_init(|| self.build()).await.clone()
    }

    /// Assembles the record from identity, crate version, and metadata.
    async fn build(&self) -> ServiceInfoRecord {
        let git = if self.debug {
            self.metadata.metadata().await
        } else {
            None
        };
        let git = git.unwrap_or_default();
        let bento = BentoInfoBlock {
            service_kind: Some(self.kind.clone()),
            data_service: Some(false),
            workflow_provider: Some(false),
            git_tag: git.tag,
            git_branch: git.branch,
            git_commit: git.commit,
            extra: Map::new(),
        };
        ServiceInfoRecord {
            id: self.identity.service_id.as_str().into(),
            name: self.identity.service_name.clone(),
            service_type: ServiceType {
                group: SERVICE_GROUP.to_string(),
                artifact: SERVICE_ARTIFACT.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            description: Some(self.identity.description.clone()),
            organization: Some(json!({
                "name": "C3G",
                "url": "https://www.computationalgenomics.ca",
            })),
            contact_url: Some(self.identity.contact_url.clone()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Some(if self.debug { "dev" } else { "prod" }.to_string()),
            bento: Some(bento),
            url: None,
            extra: Map::new(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
