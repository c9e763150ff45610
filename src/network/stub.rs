//! Offline and canned-response network backends

use crate::error::{ShelterError, ShelterResult};
use crate::http::{cache_key, Request, Response};
use crate::network::Network;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A network that is never reachable
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineNetwork;

#[async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, request: &Request) -> ShelterResult<Response> {
        Err(ShelterError::network(&request.url, "network unreachable (offline)"))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

/// Canned responses keyed by URL, with an online switch.
///
/// Unknown URLs answer 404. Every fetch attempt is recorded, including
/// those made while offline.
#[derive(Debug)]
pub struct StaticNetwork {
    responses: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl StaticNetwork {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` with status 200 at `url`
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.insert(Response::new(url, 200, body));
        self
    }

    pub fn insert(&self, response: Response) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(cache_key(&response.url).to_string(), response);
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// URLs of every fetch attempt so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }

    pub fn reset_calls(&self) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.clear();
        }
    }
}

impl Default for StaticNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &Request) -> ShelterResult<Response> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.url.clone());
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(ShelterError::network(&request.url, "network unreachable (offline)"));
        }

        let responses = self
            .responses
            .lock()
            .map_err(|_| ShelterError::Internal("response table poisoned".to_string()))?;
        Ok(responses
            .get(request.cache_key())
            .cloned()
            .unwrap_or_else(|| Response::new(&request.url, 404, "Not Found")))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
