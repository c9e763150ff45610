//! In-memory cache storage

use crate::error::{ShelterError, ShelterResult};
use crate::http::{cache_key, Response};
use crate::storage::CacheStorage;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Cache storage held in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    // Vec keeps creation order; bucket counts stay small
    buckets: RwLock<Vec<(String, BTreeMap<String, Response>)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, bucket: &str) -> ShelterResult<bool> {
        let mut buckets = self.buckets.write().await;
        if buckets.iter().any(|(name, _)| name == bucket) {
            return Ok(false);
        }
        buckets.push((bucket.to_string(), BTreeMap::new()));
        Ok(true)
    }

    async fn has(&self, bucket: &str) -> ShelterResult<bool> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().any(|(name, _)| name == bucket))
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn delete(&self, bucket: &str) -> ShelterResult<bool> {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|(name, _)| name != bucket);
        Ok(buckets.len() != before)
    }

    async fn put(&self, bucket: &str, url: &str, response: &Response) -> ShelterResult<()> {
        let mut buckets = self.buckets.write().await;
        let (_, entries) = buckets
            .iter_mut()
            .find(|(name, _)| name == bucket)
            .ok_or_else(|| ShelterError::BucketNotFound(bucket.to_string()))?;
        entries.insert(cache_key(url).to_string(), response.clone());
        Ok(())
    }

    async fn lookup(&self, bucket: &str, url: &str) -> ShelterResult<Option<Response>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|(name, _)| name == bucket)
            .and_then(|(_, entries)| entries.get(cache_key(url)).cloned()))
    }

    async fn entries(&self, bucket: &str) -> ShelterResult<Vec<String>> {
        let buckets = self.buckets.read().await;
        let (_, entries) = buckets
            .iter()
            .find(|(name, _)| name == bucket)
            .ok_or_else(|| ShelterError::BucketNotFound(bucket.to_string()))?;
        Ok(entries.keys().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
