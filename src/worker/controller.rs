//! The cache controller: install, activate, fetch, push and sync handlers
//!
//! Every handler is an async fn; the host awaits the returned future
//! before it considers the event settled.

use crate::error::{ShelterError, ShelterResult};
use crate::http::{Request, Response};
use crate::network::Network;
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::storage::CacheStorage;
use crate::sync_routine::{NoopSync, SyncRoutine};
use crate::worker::config::ControllerConfig;
use crate::worker::event::{
    ActivateReport, Event, EventOutcome, FetchReport, InstallReport, ResponseSource, Route,
    SyncOutcome,
};
use futures_util::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache controller bound to one configuration
#[derive(Clone)]
pub struct Controller {
    config: Arc<ControllerConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    notifier: Arc<dyn Notifier>,
    sync: Arc<dyn SyncRoutine>,
}

impl Controller {
    /// Create a controller that logs notifications and has no sync routine
    pub fn new(
        config: ControllerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            network,
            notifier: Arc::new(LogNotifier),
            sync: Arc::new(NoopSync),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_sync(mut self, sync: Arc<dyn SyncRoutine>) -> Self {
        self.sync = sync;
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Handle one event
    pub async fn dispatch(&self, event: Event) -> ShelterResult<EventOutcome> {
        debug!("Dispatching {}", event.name());
        match event {
            Event::Install => self.install().await.map(EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::FetchNavigation(request) => self
                .fetch_navigation(&request)
                .await
                .map(EventOutcome::Responded),
            Event::FetchResource(request) => self
                .fetch_resource(&request)
                .await
                .map(EventOutcome::Responded),
            Event::Push(payload) => self
                .push(payload.as_deref())
                .await
                .map(EventOutcome::Notified),
            Event::Sync(tag) => self.sync(&tag).await.map(EventOutcome::Synced),
        }
    }

    /// Precache every manifest URL into the current bucket.
    ///
    /// All-or-nothing: fetches run concurrently and nothing is written
    /// unless every one returns an ok response. A bucket created by a
    /// failed attempt is removed again.
    pub async fn install(&self) -> ShelterResult<InstallReport> {
        let cache_name = &self.config.cache_name;
        let urls = self.config.manifest.urls();

        let created = self.storage.open(cache_name).await?;
        info!("Precaching {} assets into {}", urls.len(), cache_name);

        let result = async {
            let entries = try_join_all(urls.iter().map(|url| self.precache_one(url))).await?;
            self.storage.put_all(cache_name, &entries).await
        }
        .await;

        if let Err(e) = result {
            if created {
                if let Err(cleanup) = self.storage.delete(cache_name).await {
                    warn!("Failed to remove partial bucket {}: {}", cache_name, cleanup);
                }
            }
            return Err(e);
        }

        info!("Precached {} assets", urls.len());
        Ok(InstallReport {
            cache_name: cache_name.clone(),
            cached: urls.to_vec(),
            created,
            skip_waiting: true,
        })
    }

    async fn precache_one(&self, url: &str) -> ShelterResult<(String, Response)> {
        let response = self
            .network
            .fetch(&Request::get(url))
            .await
            .map_err(|e| ShelterError::Install {
                url: url.to_string(),
                reason: match e {
                    ShelterError::Network { reason, .. } => reason,
                    other => other.to_string(),
                },
            })?;

        if !response.ok() {
            return Err(ShelterError::Install {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        debug!("Fetched {} ({} bytes)", url, response.body.len());
        Ok((url.to_string(), response))
    }

    /// Delete every bucket except the current one, then claim clients.
    ///
    /// Deletions run in parallel and fail independently; failures are
    /// logged and reported, never returned as errors.
    pub async fn activate(&self) -> ShelterResult<ActivateReport> {
        let cache_name = &self.config.cache_name;

        let keys = match self.storage.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Could not enumerate cache buckets: {}", e);
                Vec::new()
            }
        };
        let stale: Vec<String> = keys.into_iter().filter(|k| k != cache_name).collect();

        let results = join_all(stale.iter().map(|name| async move {
            info!("Deleting stale cache {}", name);
            (name.clone(), self.storage.delete(name).await)
        }))
        .await;

        let mut deleted = vec![];
        let mut failed = vec![];
        for (name, result) in results {
            match result {
                Ok(_) => deleted.push(name),
                Err(e) => {
                    warn!("Failed to delete stale cache {}: {}", name, e);
                    failed.push((name, e.to_string()));
                }
            }
        }

        Ok(ActivateReport {
            cache_name: cache_name.clone(),
            deleted,
            failed,
            claim_clients: true,
        })
    }

    /// Route a request by classification
    pub async fn fetch(&self, request: &Request) -> ShelterResult<FetchReport> {
        if request.is_navigation() {
            self.fetch_navigation(request).await
        } else {
            self.fetch_resource(request).await
        }
    }

    /// Network first; on any network error serve the cached offline page.
    ///
    /// Network responses are returned as-is, whatever their status, and
    /// are not written to the cache.
    pub async fn fetch_navigation(&self, request: &Request) -> ShelterResult<FetchReport> {
        match self.network.fetch(request).await {
            Ok(response) => {
                debug!("Navigation {} answered by network", request.url);
                Ok(FetchReport {
                    route: Route::Navigation,
                    source: ResponseSource::Network,
                    response,
                })
            }
            Err(e) => {
                let offline_url = self.config.offline_url();
                warn!(
                    "Navigation to {} failed ({}), serving {}",
                    request.url, e, offline_url
                );
                let response = self
                    .storage
                    .lookup(&self.config.cache_name, offline_url)
                    .await?
                    .ok_or_else(|| ShelterError::OfflineFallbackMissing {
                        url: offline_url.to_string(),
                    })?;
                Ok(FetchReport {
                    route: Route::Navigation,
                    source: ResponseSource::OfflineFallback,
                    response,
                })
            }
        }
    }

    /// Cache first; on a miss, one network fetch whose result is not cached
    pub async fn fetch_resource(&self, request: &Request) -> ShelterResult<FetchReport> {
        if request.method.is_cacheable() {
            match self
                .storage
                .lookup(&self.config.cache_name, request.cache_key())
                .await
            {
                Ok(Some(response)) => {
                    debug!("Cache hit for {}", request.url);
                    return Ok(FetchReport {
                        route: Route::Resource,
                        source: ResponseSource::Cache,
                        response,
                    });
                }
                Ok(None) => debug!("Cache miss for {}", request.url),
                Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
            }
        }

        let response = self.network.fetch(request).await?;
        Ok(FetchReport {
            route: Route::Resource,
            source: ResponseSource::Network,
            response,
        })
    }

    /// Show a notification for a push message
    pub async fn push(&self, payload: Option<&str>) -> ShelterResult<Notification> {
        let notification = Notification {
            title: self.config.app_name.clone(),
            body: payload
                .map(str::to_string)
                .unwrap_or_else(|| self.config.push_placeholder.clone()),
        };
        self.notifier.show(&notification).await?;
        Ok(notification)
    }

    /// Run the sync routine if `tag` is the configured sentinel
    pub async fn sync(&self, tag: &str) -> ShelterResult<SyncOutcome> {
        if tag != self.config.sync_tag {
            debug!("Ignoring sync tag '{}'", tag);
            return Ok(SyncOutcome::Ignored);
        }
        self.sync.run(tag).await?;
        Ok(SyncOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, RequestMode};
    use crate::network::StaticNetwork;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const OFFLINE_BODY: &str = "<h1>You are offline</h1>";

    fn app_config() -> ControllerConfig {
        ControllerConfig::new("v1", "/app/", &["", "index.html", "offline.html"]).unwrap()
    }

    fn app_network() -> Arc<StaticNetwork> {
        Arc::new(
            StaticNetwork::new()
                .with_page("/app/", "<h1>root</h1>")
                .with_page("/app/index.html", "<h1>index</h1>")
                .with_page("/app/offline.html", OFFLINE_BODY),
        )
    }

    fn controller(network: Arc<StaticNetwork>) -> (Controller, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let controller = Controller::new(app_config(), storage.clone(), network);
        (controller, storage)
    }

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<Notification>>);

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn show(&self, notification: &Notification) -> ShelterResult<()> {
            self.0.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSync(Mutex<Vec<String>>);

    #[async_trait]
    impl SyncRoutine for CountingSync {
        async fn run(&self, tag: &str) -> ShelterResult<()> {
            self.0.lock().unwrap().push(tag.to_string());
            Ok(())
        }
    }

    /// Storage whose deletes fail for one bucket name
    struct FlakyDeleteStorage {
        inner: MemoryStorage,
        poisoned: String,
    }

    #[async_trait]
    impl CacheStorage for FlakyDeleteStorage {
        async fn open(&self, bucket: &str) -> ShelterResult<bool> {
            self.inner.open(bucket).await
        }
        async fn has(&self, bucket: &str) -> ShelterResult<bool> {
            self.inner.has(bucket).await
        }
        async fn keys(&self) -> ShelterResult<Vec<String>> {
            self.inner.keys().await
        }
        async fn delete(&self, bucket: &str) -> ShelterResult<bool> {
            if bucket == self.poisoned {
                return Err(ShelterError::Internal("disk on fire".to_string()));
            }
            self.inner.delete(bucket).await
        }
        async fn put(&self, bucket: &str, url: &str, response: &Response) -> ShelterResult<()> {
            self.inner.put(bucket, url, response).await
        }
        async fn lookup(&self, bucket: &str, url: &str) -> ShelterResult<Option<Response>> {
            self.inner.lookup(bucket, url).await
        }
        async fn entries(&self, bucket: &str) -> ShelterResult<Vec<String>> {
            self.inner.entries(bucket).await
        }
        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn install_precaches_every_entry() {
        let network = app_network();
        let (controller, storage) = controller(network.clone());

        let report = controller.install().await.unwrap();
        assert!(report.created);
        assert!(report.skip_waiting);
        assert_eq!(report.cached.len(), 3);

        network.set_online(false);
        network.reset_calls();
        for url in controller.config().manifest.urls() {
            assert!(storage.lookup("v1", url).await.unwrap().is_some(), "{url} missing");
        }
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn install_fails_atomically_on_missing_asset() {
        let network = Arc::new(
            StaticNetwork::new()
                .with_page("/app/", "root")
                .with_page("/app/offline.html", OFFLINE_BODY),
        );
        let (controller, storage) = controller(network);

        let err = controller.install().await.unwrap_err();
        match err {
            ShelterError::Install { url, reason } => {
                assert_eq!(url, "/app/index.html");
                assert_eq!(reason, "HTTP 404");
            }
            other => panic!("expected Install error, got {other:?}"),
        }
        assert!(!storage.has("v1").await.unwrap());
    }

    #[tokio::test]
    async fn install_fails_when_offline() {
        let network = app_network();
        network.set_online(false);
        let (controller, storage) = controller(network);

        assert!(matches!(
            controller.install().await,
            Err(ShelterError::Install { .. })
        ));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_reinstall_keeps_existing_bucket() {
        let network = app_network();
        let (controller, storage) = controller(network.clone());
        controller.install().await.unwrap();

        network.set_online(false);
        assert!(controller.install().await.is_err());
        assert!(storage.has("v1").await.unwrap());
        assert!(storage.lookup("v1", "/app/offline.html").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        let (controller, storage) = controller(app_network());
        controller.install().await.unwrap();
        let first = storage.entries("v1").await.unwrap();

        let report = controller.install().await.unwrap();
        assert!(!report.created);
        assert_eq!(storage.entries("v1").await.unwrap(), first);
        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn activate_deletes_only_stale_buckets() {
        let (controller, storage) = controller(app_network());
        storage.open("v0").await.unwrap();
        storage.open("legacy").await.unwrap();
        controller.install().await.unwrap();
        let before = storage.entries("v1").await.unwrap();

        let report = controller.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v0", "legacy"]);
        assert!(report.failed.is_empty());
        assert!(report.claim_clients);
        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
        assert_eq!(storage.entries("v1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn activate_isolates_delete_failures() {
        let storage = Arc::new(FlakyDeleteStorage {
            inner: MemoryStorage::new(),
            poisoned: "v0".to_string(),
        });
        storage.open("v0").await.unwrap();
        storage.open("v-old").await.unwrap();
        storage.open("v1").await.unwrap();
        let controller = Controller::new(app_config(), storage.clone(), app_network());

        let report = controller.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v-old"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "v0");
        assert_eq!(storage.keys().await.unwrap(), vec!["v0", "v1"]);
    }

    #[tokio::test]
    async fn offline_navigation_serves_fallback() {
        let network = app_network();
        let (controller, _) = controller(network.clone());
        controller.install().await.unwrap();

        network.set_online(false);
        let report = controller
            .fetch(&Request::navigate("/app/index.html"))
            .await
            .unwrap();
        assert_eq!(report.route, Route::Navigation);
        assert_eq!(report.source, ResponseSource::OfflineFallback);
        assert_eq!(report.response.text(), OFFLINE_BODY);
    }

    #[tokio::test]
    async fn online_navigation_returns_network_response() {
        let network = app_network();
        let (controller, storage) = controller(network.clone());
        controller.install().await.unwrap();

        network.insert(Response::new("/app/index.html", 200, "<h1>fresh</h1>"));
        let report = controller
            .fetch(&Request::navigate("/app/index.html"))
            .await
            .unwrap();
        assert_eq!(report.source, ResponseSource::Network);
        assert_eq!(report.response.text(), "<h1>fresh</h1>");

        // not refreshed into the cache
        let cached = storage.lookup("v1", "/app/index.html").await.unwrap().unwrap();
        assert_eq!(cached.text(), "<h1>index</h1>");
        let fallback = storage.lookup("v1", "/app/offline.html").await.unwrap().unwrap();
        assert_eq!(fallback.text(), OFFLINE_BODY);
    }

    #[tokio::test]
    async fn navigation_error_status_is_not_a_failure() {
        let network = app_network();
        let (controller, _) = controller(network);
        controller.install().await.unwrap();

        let report = controller
            .fetch_navigation(&Request::navigate("/app/missing.html"))
            .await
            .unwrap();
        assert_eq!(report.source, ResponseSource::Network);
        assert_eq!(report.response.status, 404);
    }

    #[tokio::test]
    async fn offline_navigation_without_fallback_fails() {
        let network = app_network();
        network.set_online(false);
        let (controller, _) = controller(network);

        let err = controller
            .fetch(&Request::navigate("/app/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShelterError::OfflineFallbackMissing { .. }));
    }

    #[tokio::test]
    async fn cached_resource_skips_network() {
        let network = app_network();
        let (controller, _) = controller(network.clone());
        controller.install().await.unwrap();
        network.reset_calls();

        let report = controller
            .fetch(&Request::get("/app/index.html"))
            .await
            .unwrap();
        assert_eq!(report.route, Route::Resource);
        assert_eq!(report.source, ResponseSource::Cache);
        assert_eq!(report.response.text(), "<h1>index</h1>");
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn uncached_resource_fetches_once_without_caching() {
        let network = app_network();
        network.insert(
            Response::new("/app/app.js", 200, "console.log(1)")
                .with_header("content-type", "text/javascript"),
        );
        let (controller, storage) = controller(network.clone());
        controller.install().await.unwrap();
        network.reset_calls();

        let report = controller.fetch(&Request::get("/app/app.js")).await.unwrap();
        assert_eq!(report.source, ResponseSource::Network);
        assert_eq!(report.response.text(), "console.log(1)");
        assert_eq!(
            report.response.headers.get("content-type"),
            Some("text/javascript")
        );
        assert_eq!(network.requests(), vec!["/app/app.js"]);
        assert!(storage.lookup("v1", "/app/app.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uncached_resource_offline_propagates() {
        let network = app_network();
        let (controller, _) = controller(network.clone());
        controller.install().await.unwrap();
        network.set_online(false);

        let err = controller
            .fetch(&Request::get("/app/app.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShelterError::Network { .. }));
    }

    #[tokio::test]
    async fn post_bypasses_cache() {
        let network = app_network();
        let (controller, _) = controller(network.clone());
        controller.install().await.unwrap();
        network.reset_calls();

        let request = Request::get("/app/index.html").with_method(Method::Post);
        let report = controller.fetch(&request).await.unwrap();
        assert_eq!(report.source, ResponseSource::Network);
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn cors_html_request_without_accept_is_resource() {
        let network = app_network();
        let (controller, _) = controller(network);
        controller.install().await.unwrap();

        let request = Request::get("/app/").with_mode(RequestMode::Cors);
        let report = controller.fetch(&request).await.unwrap();
        assert_eq!(report.route, Route::Resource);
        assert_eq!(report.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn push_uses_payload_or_placeholder() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, _) = controller(app_network());
        let controller = controller.with_notifier(notifier.clone());

        controller.push(Some("New message")).await.unwrap();
        controller.push(None).await.unwrap();

        let shown = notifier.0.lock().unwrap().clone();
        assert_eq!(shown[0].title, "My PWA");
        assert_eq!(shown[0].body, "New message");
        assert_eq!(shown[1].body, "Notification without data");
    }

    #[tokio::test]
    async fn sync_runs_only_for_matching_tag() {
        let routine = Arc::new(CountingSync::default());
        let (controller, _) = controller(app_network());
        let controller = controller.with_sync(routine.clone());

        assert_eq!(
            controller.sync("sync-data").await.unwrap(),
            SyncOutcome::Completed
        );
        assert_eq!(
            controller.sync("other-tag").await.unwrap(),
            SyncOutcome::Ignored
        );
        assert_eq!(*routine.0.lock().unwrap(), vec!["sync-data"]);
    }

    #[tokio::test]
    async fn dispatch_routes_events() {
        let network = app_network();
        let (controller, _) = controller(network.clone());

        assert!(matches!(
            controller.dispatch(Event::Install).await.unwrap(),
            EventOutcome::Installed(_)
        ));
        assert!(matches!(
            controller.dispatch(Event::Activate).await.unwrap(),
            EventOutcome::Activated(_)
        ));

        network.set_online(false);
        match controller
            .dispatch(Event::fetch(Request::navigate("/app/index.html")))
            .await
            .unwrap()
        {
            EventOutcome::Responded(report) => {
                assert_eq!(report.source, ResponseSource::OfflineFallback)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(matches!(
            controller.dispatch(Event::Push(None)).await.unwrap(),
            EventOutcome::Notified(_)
        ));
        assert!(matches!(
            controller.dispatch(Event::Sync("nope".to_string())).await.unwrap(),
            EventOutcome::Synced(SyncOutcome::Ignored)
        ));
    }
}
