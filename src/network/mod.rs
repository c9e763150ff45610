//! Network abstraction
//!
//! The controller never talks to a socket directly; it asks a [`Network`]
//! to fetch. Backends:
//! - [`HttpNetwork`]: real HTTP via `ureq`
//! - [`LocalNetwork`]: serves a build output directory
//! - [`OfflineNetwork`]: always unreachable
//! - [`StaticNetwork`]: canned responses with a call counter

mod http_client;
mod local;
mod stub;

pub use http_client::HttpNetwork;
pub use local::LocalNetwork;
pub use stub::{OfflineNetwork, StaticNetwork};

use crate::config::schema::NetworkConfig;
use crate::error::ShelterResult;
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// Abstract fetch primitive
///
/// Any `Err` means the request never produced a response (offline, DNS,
/// timeout). HTTP error statuses are `Ok` responses.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> ShelterResult<Response>;

    /// Backend name for display
    fn name(&self) -> &'static str;
}

/// Create the network backend selected by config
///
/// `offline` wins over `root`, which wins over HTTP to `origin`.
pub fn create_network(config: &NetworkConfig) -> ShelterResult<Arc<dyn Network>> {
    if config.offline {
        return Ok(Arc::new(OfflineNetwork));
    }
    if let Some(ref root) = config.root {
        return Ok(Arc::new(LocalNetwork::new(root.clone())));
    }
    Ok(Arc::new(HttpNetwork::new(config)))
}

/// Resolve a possibly relative URL against an origin
pub fn resolve_url(origin: &str, url: &str) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", origin, url)
    } else {
        format!("{}/{}", origin, url)
    }
}

/// Path component of a URL, without query or fragment
pub fn url_path(url: &str) -> &str {
    let rest = match url.split_once("://") {
        Some((_, after_scheme)) => after_scheme
            .find('/')
            .map_or("/", |slash| &after_scheme[slash..]),
        None => url,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
