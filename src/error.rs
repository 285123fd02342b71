//! Error types for retext.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rewrite runs.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid rule '{pattern}': {message}")]
    InvalidRule { pattern: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    Decode { path: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Root directory {path} is unreadable: {source}")]
    RootUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RewriteError {
    pub(crate) fn invalid_rule(pattern: &str, message: impl Into<String>) -> Self {
        RewriteError::InvalidRule {
            pattern: pattern.to_string(),
            message: message.into(),
        }
    }

    /// Returns true for errors that abort a run before any file is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RewriteError::RootNotFound(_)
                | RewriteError::RootUnreadable { .. }
                | RewriteError::InvalidRule { .. }
                | RewriteError::InvalidConfig(_)
                | RewriteError::Regex(_)
                | RewriteError::Glob(_)
        )
    }
}

/// A specialized Result type for rewrite operations.
pub type Result<T> = std::result::Result<T, RewriteError>;
