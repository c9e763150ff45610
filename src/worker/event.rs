//! Events delivered to the controller and what handling them produced

use crate::http::{Request, Response};
use crate::notify::Notification;
use serde::Serialize;
use std::fmt;

/// Closed set of events the controller handles
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    FetchNavigation(Request),
    FetchResource(Request),
    /// Push message with an optional text payload
    Push(Option<String>),
    /// Background sync with its tag
    Sync(String),
}

impl Event {
    /// Classify an intercepted request
    pub fn fetch(request: Request) -> Self {
        if request.is_navigation() {
            Self::FetchNavigation(request)
        } else {
            Self::FetchResource(request)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::FetchNavigation(_) => "fetch.navigation",
            Self::FetchResource(_) => "fetch.resource",
            Self::Push(_) => "push",
            Self::Sync(_) => "sync",
        }
    }
}

/// Fetch strategy applied to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Network first, offline page on failure
    Navigation,
    /// Cache first, network on miss
    Resource,
}

/// Where a fetch response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::OfflineFallback => write!(f, "offline-fallback"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub cache_name: String,
    /// URLs written to the bucket, in manifest order
    pub cached: Vec<String>,
    /// Whether this install created the bucket
    pub created: bool,
    /// Activate without waiting for older workers to release clients
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    /// Stale buckets that could not be deleted, with the reason
    pub failed: Vec<(String, String)>,
    /// Take control of already-open clients
    pub claim_clients: bool,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub route: Route,
    pub source: ResponseSource,
    pub response: Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    /// Tag matched and the routine finished
    Completed,
    /// Tag did not match; nothing ran
    Ignored,
}

/// Result of handling one event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Responded(FetchReport),
    Notified(Notification),
    Synced(SyncOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestMode;

    #[test]
    fn fetch_classifies_navigation() {
        let event = Event::fetch(Request::get("/app/").with_mode(RequestMode::Navigate));
        assert!(matches!(event, Event::FetchNavigation(_)));
        assert_eq!(event.name(), "fetch.navigation");
    }

    #[test]
    fn fetch_without_accept_is_resource() {
        let event = Event::fetch(Request::get("/app/app.js"));
        assert!(matches!(event, Event::FetchResource(_)));
    }

    #[test]
    fn source_display() {
        assert_eq!(ResponseSource::OfflineFallback.to_string(), "offline-fallback");
        assert_eq!(ResponseSource::Cache.to_string(), "cache");
    }
}
