// crates/bento-registry-cli/src/main.rs
// ============================================================================
// Module: Bento Registry CLI Entry Point
// Description: Command dispatcher for the Bento service registry.
// Purpose: Serve the registry API or validate a service manifest offline.
// Dependencies: bento-registry-config, bento-registry-server, clap, tokio
// ============================================================================

//! ## Overview
//! The registry binary exposes two commands: `serve` runs the HTTP API
//! until stopped, and `check-manifest` loads and resolves the configured
//! service manifest without starting the server, so deployments can
//! validate a manifest change before rolling it out. Both read the same
//! configuration file, resolved from `--config`, the
//! `BENTO_REGISTRY_CONFIG` environment variable, or the default filename.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use bento_registry_config::ConfigError;
use bento_registry_config::RegistryConfig;
use bento_registry_core::ManifestError;
use bento_registry_core::parse_manifest;
use bento_registry_server::ServerError;
use bento_registry_server::init_tracing;
use bento_registry_server::serve;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bento-registry", version, about = "Bento service registry")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the registry HTTP server.
    Serve {
        /// Path to the configuration file.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Load and resolve the service manifest without serving.
    CheckManifest {
        /// Path to the configuration file.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors surfaced to the CLI user.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration loading or validation failed.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// Manifest content is invalid.
    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),
    /// Server startup or runtime failure.
    #[error("server: {0}")]
    Server(#[from] ServerError),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            emit_error(&format!("error: {err}"));
            ExitCode::FAILURE
        }
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
        } => {
            let config = RegistryConfig::load(config.as_deref())?;
            init_tracing(&config.log.level);
            serve(config).await?;
            Ok(())
        }
        Commands::CheckManifest {
            config,
        } => {
            let config = RegistryConfig::load(config.as_deref())?;
            check_manifest(&config)
        }
    }
}

// ============================================================================
// SECTION: Manifest Check
// ============================================================================

/// Loads and resolves the configured manifest, printing a summary.
fn check_manifest(config: &RegistryConfig) -> Result<(), CliError> {
    let path = &config.manifest.path;
    let text = std::fs::read_to_string(path)
        .map_err(|err| ManifestError::Read(format!("{}: {err}", path.display())))?;
    let services = parse_manifest(&text, &config.node.url_vars())?;
    for (kind, descriptor) in &services {
        let role = if descriptor.data_service {
            "data service"
        } else if descriptor.workflow_provider {
            "workflow provider"
        } else {
            "service"
        };
        emit_line(&format!("{kind}: {} ({role})", descriptor.url));
    }
    emit_line(&format!(
        "{}: {} service(s) after filtering",
        path.display(),
        services.len()
    ));
    Ok(())
}

/// Writes one line to stdout.
#[allow(
    clippy::print_stdout,
    reason = "The CLI's contract is line-oriented stdout output."
)]
fn emit_line(line: &str) {
    println!("{line}");
}

/// Writes one line to stderr.
#[allow(
    clippy::print_stderr,
    reason = "The CLI's contract is line-oriented stderr diagnostics."
)]
fn emit_error(line: &str) {
    eprintln!("{line}");
}

// ============================================================================
// SECTION: Tests
// ============================================================================
