//! Configuration schema for Shelter
//!
//! Configuration is stored at `~/.config/shelter/config.toml`, or in a
//! project-local `shelter.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache controller settings
    pub worker: WorkerConfig,

    /// Network settings
    pub network: NetworkConfig,

    /// Cache storage settings
    pub storage: StorageConfig,

    /// Background sync settings
    pub sync: SyncConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log output format
    pub log_format: LogFormat,

    /// Append lifecycle events to the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            journal: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Cache controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Cache bucket name. Bump it whenever the asset list changes.
    pub version: String,

    /// Deployment root, must match the serving path
    pub base_path: String,

    /// Offline page, relative to `base_path`
    pub offline_page: String,

    /// Precached assets, relative to `base_path`
    pub assets: Vec<String>,

    /// Notification title for push messages
    pub app_name: String,

    /// Notification body when a push carries no payload
    pub push_placeholder: String,

    /// Sync tag that triggers the sync routine
    pub sync_tag: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: "pwa-cache-v1".to_string(),
            base_path: "/".to_string(),
            offline_page: "offline.html".to_string(),
            assets: vec![
                String::new(),
                "index.html".to_string(),
                "manifest.json".to_string(),
                "offline.html".to_string(),
                "icons/icon-192x192.png".to_string(),
                "icons/icon-512x512.png".to_string(),
            ],
            app_name: "My PWA".to_string(),
            push_placeholder: "Notification without data".to_string(),
            sync_tag: "sync-data".to_string(),
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Origin that relative request URLs resolve against
    pub origin: String,

    /// Serve requests from this directory instead of over HTTP
    pub root: Option<PathBuf>,

    /// Simulate an unreachable network
    pub offline: bool,

    /// User-Agent header for HTTP requests
    pub user_agent: String,

    /// Per-request timeout in seconds (unset = no timeout)
    pub timeout_secs: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            root: None,
            offline: false,
            user_agent: format!("shelter/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// State directory (default: platform data dir)
    pub dir: Option<PathBuf>,
}

/// Background sync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Command run when the sync tag fires (program followed by args)
    pub command: Vec<String>,
}
