//! Error types for Shelter
//!
//! All modules use `ShelterResult<T>` as their return type.

use crate::worker::WorkerState;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Shelter operations
pub type ShelterResult<T> = Result<T, ShelterError>;

/// All errors that can occur in Shelter
#[derive(Error, Debug)]
pub enum ShelterError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid asset manifest: {0}")]
    ManifestInvalid(String),

    // Lifecycle errors
    #[error("Precache failed for {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Worker in state {actual}, expected {expected}")]
    InvalidState {
        expected: String,
        actual: WorkerState,
    },

    #[error("No worker installed for this configuration")]
    WorkerNotInstalled,

    // Fetch errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Offline fallback {url} is not cached")]
    OfflineFallbackMissing { url: String },

    // Storage errors
    #[error("Cache bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Corrupt cache entry at {path}: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    // Sync errors
    #[error("Background sync '{tag}' failed: {reason}")]
    SyncFailed { tag: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShelterError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Install { .. } => {
                Some("Check that network.origin and worker.base_path match the serving path")
            }
            Self::OfflineFallbackMissing { .. } | Self::WorkerNotInstalled => {
                Some("Run: shelter install")
            }
            Self::ManifestInvalid(_) => Some("Run: shelter config show"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ShelterError::Install {
            url: "/app/index.html".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert!(err.to_string().contains("/app/index.html"));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn error_hint() {
        let err = ShelterError::OfflineFallbackMissing {
            url: "/offline.html".to_string(),
        };
        assert_eq!(err.hint(), Some("Run: shelter install"));
        assert_eq!(ShelterError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn not_installed_hint() {
        assert_eq!(
            ShelterError::WorkerNotInstalled.hint(),
            Some("Run: shelter install")
        );
    }

    #[test]
    fn invalid_state_display() {
        let err = ShelterError::InvalidState {
            expected: "activated".to_string(),
            actual: WorkerState::Installing,
        };
        assert_eq!(err.to_string(), "Worker in state installing, expected activated");
    }
}
