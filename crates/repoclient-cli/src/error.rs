//! Error types for the repoclient CLI
//!
//! Errors are user-facing: every variant carries a message that says what
//! went wrong and, where possible, how to fix it.

use crate::api::types::TransferStatus;
use crate::settings::Scope;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// A settings scope failed remote validation; fatal for the invocation
    #[error("Invalid settings: scope '{scope}' could not be validated. Run 'repoclient init' to repair the configuration.")]
    InvalidSettings { scope: Scope },

    /// Metadata registration or a plugin hook failed for one dataset
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// The remote side finished staging preparation in a failure state
    #[error("Transfer preparation failed: remote status is '{status}'.")]
    TransferPreparation { status: TransferStatus },

    /// The polling loop gave up before the remote side became ready
    #[error("Transfer not ready after {attempts} status check(s). The staging area may still be preparing; try again later.")]
    DeadlineExceeded { attempts: u32 },

    /// The polling loop was cancelled between status checks
    #[error("Transfer cancelled before completion.")]
    Cancelled,

    /// An input or output path is not an existing directory
    #[error("Input directory '{0}' is not a directory or doesn't exist!")]
    InvalidDirectory(PathBuf),

    /// The Repository Service answered, but not with what we needed
    #[error("Server error: {0}. Check that the repository server is reachable and your credentials are valid.")]
    Api(String),

    /// Settings file or value problem outside remote validation
    #[error("Configuration error: {0}. Check your settings file or run 'repoclient init'.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your connection and the server URL.")]
    Http(#[from] reqwest::Error),

    /// Settings file could not be parsed
    #[error("Failed to parse settings file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }
}
