//! Asset manifest: the ordered list of URLs precached at install

use crate::error::{ShelterError, ShelterResult};
use std::collections::HashSet;

/// Ordered, duplicate-free list of precached URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    base_path: String,
    urls: Vec<String>,
    offline_url: String,
}

impl AssetManifest {
    /// Build a manifest from a base path and asset suffixes.
    ///
    /// Suffixes are joined onto `base_path`; entries that are already
    /// absolute (leading `/` or a scheme) are kept verbatim. The offline
    /// page must be one of the entries.
    pub fn build(
        base_path: &str,
        assets: &[String],
        offline_page: &str,
    ) -> ShelterResult<Self> {
        let base_path = normalize_base(base_path)?;
        let offline_url = join(&base_path, offline_page);

        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(assets.len());
        for asset in assets {
            let url = join(&base_path, asset);
            if !seen.insert(url.clone()) {
                return Err(ShelterError::ManifestInvalid(format!(
                    "duplicate entry {}",
                    url
                )));
            }
            urls.push(url);
        }

        if !seen.contains(&offline_url) {
            return Err(ShelterError::ManifestInvalid(format!(
                "offline page {} is not in the asset list",
                offline_url
            )));
        }

        Ok(Self {
            base_path,
            urls,
            offline_url,
        })
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// URL served when a navigation cannot reach the network
    pub fn offline_url(&self) -> &str {
        &self.offline_url
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

fn normalize_base(base_path: &str) -> ShelterResult<String> {
    let trimmed = base_path.trim();
    if !trimmed.starts_with('/') {
        return Err(ShelterError::ManifestInvalid(format!(
            "base path '{}' must start with '/'",
            base_path
        )));
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}/", trimmed))
    }
}

fn join(base_path: &str, asset: &str) -> String {
    if asset.starts_with('/') || asset.contains("://") {
        asset.to_string()
    } else {
        format!("{}{}", base_path, asset)
    }
}
