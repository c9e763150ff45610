//! Immutable controller configuration

use crate::config::schema::WorkerConfig;
use crate::error::{ShelterError, ShelterResult};
use crate::worker::manifest::AssetManifest;

/// Everything a controller needs to know about its deployment.
///
/// Built once and shared; two controllers with different configs can
/// run side by side against the same storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Current cache bucket name
    pub cache_name: String,
    pub manifest: AssetManifest,
    pub app_name: String,
    pub push_placeholder: String,
    pub sync_tag: String,
}

impl ControllerConfig {
    /// Build from the `[worker]` config section
    pub fn from_worker(worker: &WorkerConfig) -> ShelterResult<Self> {
        if worker.version.trim().is_empty() {
            return Err(ShelterError::ManifestInvalid(
                "worker.version must not be empty".to_string(),
            ));
        }

        let manifest =
            AssetManifest::build(&worker.base_path, &worker.assets, &worker.offline_page)?;

        Ok(Self {
            cache_name: worker.version.clone(),
            manifest,
            app_name: worker.app_name.clone(),
            push_placeholder: worker.push_placeholder.clone(),
            sync_tag: worker.sync_tag.clone(),
        })
    }

    /// Minimal config with the given version, base path and assets
    pub fn new(
        cache_name: impl Into<String>,
        base_path: &str,
        assets: &[&str],
    ) -> ShelterResult<Self> {
        let worker = WorkerConfig {
            version: cache_name.into(),
            base_path: base_path.to_string(),
            assets: assets.iter().map(|a| a.to_string()).collect(),
            ..WorkerConfig::default()
        };
        Self::from_worker(&worker)
    }

    pub fn offline_url(&self) -> &str {
        self.manifest.offline_url()
    }
}
