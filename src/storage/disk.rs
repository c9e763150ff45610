//! On-disk cache storage
//!
//! Layout under the storage root:
//!
//! | Path | Contents |
//! |------|----------|
//! | `index.json` | bucket names in creation order |
//! | `<bucket-id>/<entry-id>.json` | response metadata (url, status, headers) |
//! | `<bucket-id>/<entry-id>.body` | response body bytes |
//!
//! Bucket and entry ids are truncated SHA256 hex digests of the bucket
//! name and the cache key. Files are written to a temp path and renamed.

use crate::error::{ShelterError, ShelterResult};
use crate::http::{cache_key, Response};
use crate::storage::CacheStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

const INDEX_FILE: &str = "index.json";

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// SHA256 of `input`, first `len` bytes hex-encoded
fn digest(input: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..len])
}

/// Bucket record in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketRecord {
    pub name: String,
    pub dir: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    buckets: Vec<BucketRecord>,
}

/// Entry metadata stored beside the body
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    stored_at: DateTime<Utc>,
    response: Response,
}

/// Cache storage persisted to a directory
pub struct DiskStorage {
    root: PathBuf,
    // Serializes index read-modify-write cycles
    lock: Mutex<()>,
}

impl DiskStorage {
    /// Open storage rooted at `root`, creating the directory if needed
    pub async fn open_at(root: impl Into<PathBuf>) -> ShelterResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            ShelterError::io(format!("creating cache directory {}", root.display()), e)
        })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    /// Bucket records in creation order
    pub async fn records(&self) -> ShelterResult<Vec<BucketRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_index().await?.buckets)
    }

    /// Total bytes stored for a bucket
    pub async fn usage(&self, bucket: &str) -> ShelterResult<u64> {
        let dir = match self.bucket_dir(bucket).await? {
            Some(dir) => dir,
            None => return Err(ShelterError::BucketNotFound(bucket.to_string())),
        };

        let mut total = 0;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(ShelterError::io(format!("reading {}", dir.display()), e)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShelterError::io("reading cache entry", e))?
        {
            if let Ok(meta) = entry.metadata().await {
                total += meta.len();
            }
        }
        Ok(total)
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    async fn read_index(&self) -> ShelterResult<Index> {
        let path = self.index_path();
        match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| ShelterError::CacheCorrupt {
                path,
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Index::default()),
            Err(e) => Err(ShelterError::io(format!("reading {}", path.display()), e)),
        }
    }

    async fn write_index(&self, index: &Index) -> ShelterResult<()> {
        let content = serde_json::to_string_pretty(index)?;
        write_atomic(&self.index_path(), content.as_bytes()).await
    }

    async fn bucket_dir(&self, bucket: &str) -> ShelterResult<Option<PathBuf>> {
        let _guard = self.lock.lock().await;
        let index = self.read_index().await?;
        Ok(index
            .buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| self.root.join(&b.dir)))
    }

    async fn require_bucket_dir(&self, bucket: &str) -> ShelterResult<PathBuf> {
        self.bucket_dir(bucket)
            .await?
            .ok_or_else(|| ShelterError::BucketNotFound(bucket.to_string()))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Write `content` beside `path`; nothing is visible until [`commit`]
async fn stage(path: &Path, content: &[u8]) -> ShelterResult<PathBuf> {
    let tmp = tmp_path(path);
    fs::write(&tmp, content)
        .await
        .map_err(|e| ShelterError::io(format!("writing {}", tmp.display()), e))?;
    Ok(tmp)
}

async fn commit(tmp: &Path, path: &Path) -> ShelterResult<()> {
    fs::rename(tmp, path)
        .await
        .map_err(|e| ShelterError::io(format!("renaming {}", tmp.display()), e))
}

async fn write_atomic(path: &Path, content: &[u8]) -> ShelterResult<()> {
    let tmp = stage(path, content).await?;
    commit(&tmp, path).await
}

/// Body and metadata paths for `url`, plus the serialized metadata
fn entry_files(
    dir: &Path,
    url: &str,
    response: &Response,
) -> ShelterResult<(PathBuf, PathBuf, String)> {
    let key = cache_key(url);
    let id = digest(key, 16);
    let meta = EntryMeta {
        key: key.to_string(),
        stored_at: Utc::now(),
        response: response.clone(),
    };
    Ok((
        dir.join(format!("{}.body", id)),
        dir.join(format!("{}.json", id)),
        serde_json::to_string_pretty(&meta)?,
    ))
}

/// Stage every file of a batch, bodies before metadata
async fn stage_batch(
    dir: &Path,
    entries: &[(String, Response)],
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> ShelterResult<()> {
    let mut metas = Vec::with_capacity(entries.len());
    for (url, response) in entries {
        let (body_path, meta_path, content) = entry_files(dir, url, response)?;
        let tmp = stage(&body_path, &response.body).await?;
        staged.push((tmp, body_path));
        metas.push((meta_path, content));
    }
    for (meta_path, content) in metas {
        let tmp = stage(&meta_path, content.as_bytes()).await?;
        staged.push((tmp, meta_path));
    }
    Ok(())
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, bucket: &str) -> ShelterResult<bool> {
        let _guard = self.lock.lock().await;
        let mut index = self.read_index().await?;
        if index.buckets.iter().any(|b| b.name == bucket) {
            return Ok(false);
        }

        let record = BucketRecord {
            name: bucket.to_string(),
            dir: digest(bucket, 8),
            created_at: Utc::now(),
        };
        let dir = self.root.join(&record.dir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShelterError::io(format!("creating bucket {}", dir.display()), e))?;

        index.buckets.push(record);
        self.write_index(&index).await?;
        debug!("Created cache bucket {}", bucket);
        Ok(true)
    }

    async fn has(&self, bucket: &str) -> ShelterResult<bool> {
        Ok(self.bucket_dir(bucket).await?.is_some())
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        Ok(self.records().await?.into_iter().map(|b| b.name).collect())
    }

    async fn delete(&self, bucket: &str) -> ShelterResult<bool> {
        let _guard = self.lock.lock().await;
        let mut index = self.read_index().await?;
        let Some(pos) = index.buckets.iter().position(|b| b.name == bucket) else {
            return Ok(false);
        };

        let record = index.buckets.remove(pos);
        self.write_index(&index).await?;

        let dir = self.root.join(&record.dir);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ShelterError::io(
                    format!("removing bucket {}", dir.display()),
                    e,
                ))
            }
        }
        debug!("Deleted cache bucket {}", bucket);
        Ok(true)
    }

    async fn put(&self, bucket: &str, url: &str, response: &Response) -> ShelterResult<()> {
        let dir = self.require_bucket_dir(bucket).await?;
        let (body_path, meta_path, content) = entry_files(&dir, url, response)?;

        // Body first so a visible .json always has its body
        write_atomic(&body_path, &response.body).await?;
        write_atomic(&meta_path, content.as_bytes()).await
    }

    /// Stages the whole batch before renaming anything into place, so a
    /// write failure leaves the bucket as it was.
    async fn put_all(&self, bucket: &str, entries: &[(String, Response)]) -> ShelterResult<()> {
        let dir = self.require_bucket_dir(bucket).await?;

        let mut staged = Vec::with_capacity(entries.len() * 2);
        if let Err(e) = stage_batch(&dir, entries, &mut staged).await {
            for (tmp, _) in &staged {
                if let Err(cleanup) = fs::remove_file(tmp).await {
                    debug!("Failed to remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e);
        }

        for (tmp, path) in &staged {
            commit(tmp, path).await?;
        }
        debug!("Stored {} entries in {}", entries.len(), bucket);
        Ok(())
    }

    async fn lookup(&self, bucket: &str, url: &str) -> ShelterResult<Option<Response>> {
        let Some(dir) = self.bucket_dir(bucket).await? else {
            return Ok(None);
        };
        let id = digest(cache_key(url), 16);
        let meta_path = dir.join(format!("{}.json", id));

        let content = match fs::read_to_string(&meta_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShelterError::io(
                    format!("reading {}", meta_path.display()),
                    e,
                ))
            }
        };
        let meta: EntryMeta =
            serde_json::from_str(&content).map_err(|e| ShelterError::CacheCorrupt {
                path: meta_path.clone(),
                reason: e.to_string(),
            })?;

        let body_path = dir.join(format!("{}.body", id));
        let body = fs::read(&body_path).await.map_err(|e| ShelterError::CacheCorrupt {
            path: body_path,
            reason: e.to_string(),
        })?;

        let mut response = meta.response;
        response.body = body;
        Ok(Some(response))
    }

    async fn entries(&self, bucket: &str) -> ShelterResult<Vec<String>> {
        let dir = self.require_bucket_dir(bucket).await?;
        let mut keys = vec![];

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(ShelterError::io(format!("reading {}", dir.display()), e)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShelterError::io("reading cache entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path).await.ok();
                if let Some(meta) = content.and_then(|c| serde_json::from_str::<EntryMeta>(&c).ok())
                {
                    keys.push(meta.key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
