//! Wiring shared by the commands that drive the worker

use crate::config::{Config, ConfigManager};
use crate::error::ShelterResult;
use crate::journal::Journal;
use crate::network::{create_network, Network, OfflineNetwork};
use crate::notify::ConsoleNotifier;
use crate::storage::DiskStorage;
use crate::sync_routine::create_sync_routine;
use crate::worker::{Controller, ControllerConfig, WorkerHost};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const CACHES_DIR: &str = "caches";
const RECORD_FILE: &str = "worker.json";

/// Where the worker record for `config` lives
pub fn record_path(config: &Config) -> PathBuf {
    ConfigManager::resolve_state_dir(config).join(RECORD_FILE)
}

/// Open the on-disk cache storage for `config`
pub async fn open_storage(config: &Config) -> ShelterResult<DiskStorage> {
    let state_dir = ConfigManager::ensure_state_dir(config).await?;
    DiskStorage::open_at(state_dir.join(CACHES_DIR)).await
}

/// Build the controller from config and resume its persisted lifecycle.
///
/// `offline` forces an unreachable network regardless of config.
pub async fn open_host(config: &Config, offline: bool) -> ShelterResult<WorkerHost> {
    let controller_config = ControllerConfig::from_worker(&config.worker)?;
    let storage = Arc::new(open_storage(config).await?);
    let network: Arc<dyn Network> = if offline {
        Arc::new(OfflineNetwork)
    } else {
        create_network(&config.network)?
    };
    debug!(
        "Worker {} using {} network",
        controller_config.cache_name,
        network.name()
    );

    let controller = Controller::new(controller_config, storage, network)
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_sync(create_sync_routine(&config.sync));

    let host = WorkerHost::resume(controller, record_path(config))
        .await?
        .with_journal(Journal::new(config));
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerState;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.dir = Some(dir.path().join("state"));
        config.network.offline = true;
        config
    }

    #[tokio::test]
    async fn open_host_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let host = open_host(&config, false).await.unwrap();
        assert_eq!(host.state(), WorkerState::Installing);
        assert_eq!(host.controller().config().cache_name, "pwa-cache-v1");
        assert_eq!(host.controller().network().name(), "offline");
        assert!(dir.path().join("state").join(CACHES_DIR).is_dir());
    }

    #[test]
    fn record_path_in_state_dir() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        assert_eq!(
            record_path(&config),
            dir.path().join("state").join(RECORD_FILE)
        );
    }
}
