//! Configuration loading errors

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in '{path}': {message}")]
    Yaml { path: PathBuf, message: String },

    #[error("invalid JSON in '{path}': {message}")]
    Json { path: PathBuf, message: String },

    #[error("document root of '{path}' must be a mapping, got {actual}")]
    NotAMapping { path: PathBuf, actual: String },

    #[error("cannot encode manifest: {0}")]
    Encode(String),

    #[error("invalid configuration in '{path}': {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(path: impl Into<PathBuf>, source: SchemaError) -> Self {
        ConfigError::Invalid {
            path: path.into(),
            source,
        }
    }

    /// The schema error behind this failure, if any
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            ConfigError::Invalid { source, .. } => Some(source),
            ConfigError::Schema(err) => Some(err),
            _ => None,
        }
    }
}
