//! Error types for codeindex

use std::path::PathBuf;
use thiserror::Error;

use crate::index::qualified::QualifiedNameError;

/// Result type alias using codeindex's Error
pub type Result<T> = std::result::Result<T, Error>;

/// codeindex error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    #[error("No project root found (looked for .git, package.json, Cargo.toml, etc.)")]
    NoProjectRoot,

    #[error("Index not found for project: {path}")]
    IndexNotFound { path: PathBuf },

    #[error("Index error: {message}")]
    IndexError { message: String },

    #[error("Unsupported index schema version '{version}' (minimum supported is {minimum})")]
    UnsupportedSchema {
        version: String,
        minimum: &'static str,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Qualified name error: {0}")]
    QualifiedName(#[from] QualifiedNameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}
