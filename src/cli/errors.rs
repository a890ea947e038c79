//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// A configuration document could not be read or parsed
    ConfigError,
    /// A configuration document was read but failed validation
    InvalidConfig,
    /// No manifest at the given location
    ManifestNotFound,
    /// I/O error (stdout)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "GAPX_CLI_CONFIG_ERROR",
            Self::InvalidConfig => "GAPX_CLI_INVALID_CONFIG",
            Self::ManifestNotFound => "GAPX_CLI_MANIFEST_NOT_FOUND",
            Self::IoError => "GAPX_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidConfig, msg)
    }

    pub fn manifest_not_found(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::ManifestNotFound,
            format!("Manifest not found: {}", path.display()),
        )
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        match e.schema_error() {
            Some(schema) => {
                let message = match schema.path() {
                    Some(path) => format!("{} [{} at {}]", e, schema.code(), path),
                    None => format!("{} [{}]", e, schema.code()),
                };
                Self::invalid_config(message)
            }
            None => Self::config_error(e.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
