//! Cache storage abstraction
//!
//! Named buckets mapping a request URL to a response snapshot. Two
//! backends are provided:
//! - [`MemoryStorage`]: in-process, used for embedding and tests
//! - [`DiskStorage`]: persisted under the state directory, used by the CLI
//!
//! Buckets are listed in creation order.

pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::ShelterResult;
use crate::http::Response;
use async_trait::async_trait;

/// Abstract cache storage interface
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if absent. Returns true if it was created.
    async fn open(&self, bucket: &str) -> ShelterResult<bool>;

    /// Check whether a bucket exists
    async fn has(&self, bucket: &str) -> ShelterResult<bool>;

    /// List bucket names in creation order
    async fn keys(&self) -> ShelterResult<Vec<String>>;

    /// Delete a bucket. Returns false if it did not exist.
    async fn delete(&self, bucket: &str) -> ShelterResult<bool>;

    /// Store a response under `url`, replacing any previous entry
    async fn put(&self, bucket: &str, url: &str, response: &Response) -> ShelterResult<()>;

    /// Store a batch of responses
    async fn put_all(&self, bucket: &str, entries: &[(String, Response)]) -> ShelterResult<()> {
        for (url, response) in entries {
            self.put(bucket, url, response).await?;
        }
        Ok(())
    }

    /// Look up `url` in one bucket
    async fn lookup(&self, bucket: &str, url: &str) -> ShelterResult<Option<Response>>;

    /// URLs stored in a bucket, sorted
    async fn entries(&self, bucket: &str) -> ShelterResult<Vec<String>>;

    /// Backend name for display
    fn backend_name(&self) -> &'static str;
}
