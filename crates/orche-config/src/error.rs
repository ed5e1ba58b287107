//! Configuration file errors.
//!
//! Every variant is recoverable: a file that cannot be used contributes
//! nothing to the resolved configuration and is reported as a warning.

use std::path::PathBuf;
use thiserror::Error;

/// A configuration source that could not be used.
#[derive(Error, Debug)]
pub enum ConfigFileError {
    /// Configuration file not found.
    #[error("configuration file not found: {}", path.display())]
    NotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration {}: {source}", path.display())]
    Toml {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// JSON parsing error.
    #[error("failed to parse JSON configuration {}: {source}", path.display())]
    Json {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The environment file has no entry for the application.
    #[error("no configuration for application `{app_name}` in {}", path.display())]
    MissingApplication {
        /// Path to the file.
        path: PathBuf,
        /// The key that was looked up.
        app_name: String,
    },

    /// Failed to load a `.env` file.
    #[error("failed to load .env file: {reason}")]
    Dotenv {
        /// Explanation of the failure.
        reason: String,
    },
}

impl ConfigFileError {
    /// Create a new file not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
