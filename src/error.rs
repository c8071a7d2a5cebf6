//! Centralized error types for registry-mirror
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for mirror operations
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registries declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    #[error("Sync command error: {0}")]
    Command(#[from] CommandError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Password environment variable {var} for {field} is not set")]
    PasswordEnvMissing { field: String, var: String },
}

/// Insecure registries declaration errors
#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("Failed to write registries declaration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while preparing the shared sync arguments
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Registries declaration {path} not present but an insecure registry is configured")]
    MissingDeclaration { path: PathBuf },
}

/// Source catalog query errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to build HTTP client for catalog queries: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Catalog request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Catalog request to {url} returned HTTP {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode catalog response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-repository sync errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' failed ({status})\n{stderr}")]
    Invocation {
        command: String,
        status: String,
        stderr: String,
    },
}
