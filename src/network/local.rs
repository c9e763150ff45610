//! Directory-backed network backend

use crate::error::{ShelterError, ShelterResult};
use crate::http::{Method, Request, Response};
use crate::network::{url_path, Network};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Serves request paths from files under a root directory.
///
/// A path ending in `/` serves its `index.html`. Missing files answer
/// 404 and non-GET/HEAD methods answer 405, the way a static file
/// server would.
pub struct LocalNetwork {
    root: PathBuf,
}

impl LocalNetwork {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL onto a file under the root, refusing `..` escapes
    fn file_for(&self, url: &str) -> Option<PathBuf> {
        let path = url_path(url);
        let mut relative = PathBuf::new();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if path.ends_with('/') || relative.as_os_str().is_empty() {
            relative.push("index.html");
        }
        Some(self.root.join(relative))
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Network for LocalNetwork {
    async fn fetch(&self, request: &Request) -> ShelterResult<Response> {
        if !request.method.is_cacheable() {
            return Ok(Response::new(&request.url, 405, "Method Not Allowed"));
        }

        let Some(path) = self.file_for(&request.url) else {
            return Ok(Response::new(&request.url, 404, "Not Found"));
        };
        debug!("Serving {} from {}", request.url, path.display());

        match fs::read(&path).await {
            Ok(body) => {
                let body = if request.method == Method::Head {
                    Vec::new()
                } else {
                    body
                };
                Ok(Response::new(&request.url, 200, body)
                    .with_header("content-type", content_type(&path)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound || path.is_dir() => {
                Ok(Response::new(&request.url, 404, "Not Found"))
            }
            Err(e) => Err(ShelterError::io(format!("reading {}", path.display()), e)),
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
