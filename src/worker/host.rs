//! Worker host: drives the controller through its lifecycle
//!
//! The host owns the lifecycle state. It runs install, honours the
//! skip-waiting request by activating right away, and only routes fetches
//! through the controller once the worker is activated. Before that,
//! requests go straight to the network.

use crate::error::{ShelterError, ShelterResult};
use crate::http::Request;
use crate::journal::Journal;
use crate::worker::controller::Controller;
use crate::worker::event::{
    ActivateReport, Event, EventOutcome, FetchReport, InstallReport, ResponseSource, Route,
};
use crate::worker::lifecycle::{WorkerRecord, WorkerState};
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What `start` did
#[derive(Debug, Clone)]
pub struct StartReport {
    pub install: InstallReport,
    /// Present when the worker activated immediately
    pub activate: Option<ActivateReport>,
}

/// Hosts one controller and its lifecycle record
pub struct WorkerHost {
    controller: Controller,
    record: WorkerRecord,
    record_path: Option<PathBuf>,
    journal: Option<Journal>,
}

impl WorkerHost {
    /// Host a fresh worker that has not installed yet
    pub fn new(controller: Controller) -> Self {
        let record = WorkerRecord::new(controller.config().cache_name.clone());
        Self {
            controller,
            record,
            record_path: None,
            journal: None,
        }
    }

    /// Resume from a persisted record. A record for another version is
    /// ignored; that worker is superseded by this one.
    pub async fn resume(controller: Controller, record_path: PathBuf) -> ShelterResult<Self> {
        let mut host = Self::new(controller);
        if let Some(record) = WorkerRecord::load(&record_path).await? {
            if record.version == host.controller.config().cache_name {
                debug!("Resumed worker {} in state {}", record.id, record.state);
                host.record = record;
            } else {
                debug!(
                    "Persisted worker is for {}, current version is {}",
                    record.version,
                    host.controller.config().cache_name
                );
            }
        }
        host.record_path = Some(record_path);
        Ok(host)
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn record(&self) -> &WorkerRecord {
        &self.record
    }

    pub fn state(&self) -> WorkerState {
        self.record.state
    }

    /// Install, then activate if the controller asked to skip waiting.
    ///
    /// Every call starts a new worker for the current version. The new
    /// record only replaces the current one once install succeeds; a
    /// failed install leaves an active worker in control and returns the
    /// error.
    pub async fn start(&mut self) -> ShelterResult<StartReport> {
        let mut record = WorkerRecord::new(self.controller.config().cache_name.clone());
        info!("Installing worker {} ({})", record.id, record.version);

        let install = match self.controller.install().await {
            Ok(report) => report,
            Err(e) => {
                record.transition(WorkerState::Redundant)?;
                self.journal(
                    "worker.install_failed",
                    json!({"id": record.id, "version": record.version, "error": e.to_string()}),
                )
                .await;
                if self.record.state.can_intercept_fetch() {
                    warn!(
                        "Install failed, worker {} stays in control",
                        self.record.id
                    );
                } else {
                    self.commit(record).await?;
                }
                return Err(e);
            }
        };

        record.transition(WorkerState::Installed)?;
        self.commit(record).await?;
        self.journal(
            "worker.installed",
            json!({"version": self.record.version, "cached": install.cached}),
        )
        .await;

        let activate = if install.skip_waiting {
            Some(self.activate().await?)
        } else {
            info!("Worker installed, waiting to activate");
            None
        };

        Ok(StartReport { install, activate })
    }

    /// Activate an installed worker, or re-run cleanup on an active one
    pub async fn activate(&mut self) -> ShelterResult<ActivateReport> {
        match self.record.state {
            WorkerState::Installed => {
                self.transition(WorkerState::Activating).await?;
                let report = self.controller.activate().await?;
                self.record.clients_claimed = report.claim_clients;
                self.transition(WorkerState::Activated).await?;
                self.journal("worker.activated", json!(report)).await;
                info!("Worker {} activated", self.record.id);
                Ok(report)
            }
            WorkerState::Activated => {
                let report = self.controller.activate().await?;
                self.journal("worker.cleaned", json!(report)).await;
                Ok(report)
            }
            WorkerState::Installing => Err(ShelterError::WorkerNotInstalled),
            actual => Err(ShelterError::InvalidState {
                expected: "installed".to_string(),
                actual,
            }),
        }
    }

    /// Deliver one event
    pub async fn handle(&mut self, event: Event) -> ShelterResult<EventOutcome> {
        match event {
            Event::Install => {
                let report = self.start().await?;
                Ok(EventOutcome::Installed(report.install))
            }
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::FetchNavigation(request) | Event::FetchResource(request)
                if !self.record.state.can_intercept_fetch() =>
            {
                self.passthrough(&request).await.map(EventOutcome::Responded)
            }
            event => {
                let outcome = self.controller.dispatch(event).await?;
                if let EventOutcome::Responded(ref report) = outcome {
                    if report.source == ResponseSource::OfflineFallback {
                        self.journal(
                            "fetch.offline_fallback",
                            json!({"url": report.response.url}),
                        )
                        .await;
                    }
                }
                Ok(outcome)
            }
        }
    }

    /// Convenience for fetch events
    pub async fn fetch(&mut self, request: Request) -> ShelterResult<FetchReport> {
        match self.handle(Event::fetch(request)).await? {
            EventOutcome::Responded(report) => Ok(report),
            other => Err(ShelterError::Internal(format!(
                "fetch produced {:?}",
                other
            ))),
        }
    }

    /// Requests made while no active worker controls the client
    async fn passthrough(&self, request: &Request) -> ShelterResult<FetchReport> {
        debug!(
            "Worker is {}, passing {} to the network",
            self.record.state, request.url
        );
        let route = if request.is_navigation() {
            Route::Navigation
        } else {
            Route::Resource
        };
        let response = self.controller.network().fetch(request).await?;
        Ok(FetchReport {
            route,
            source: ResponseSource::Network,
            response,
        })
    }

    async fn transition(&mut self, next: WorkerState) -> ShelterResult<()> {
        self.record.transition(next)?;
        debug!("Worker {} is now {}", self.record.id, next);
        self.persist().await
    }

    /// Make `record` the current worker and persist it
    async fn commit(&mut self, record: WorkerRecord) -> ShelterResult<()> {
        debug!("Worker {} is now {}", record.id, record.state);
        self.record = record;
        self.persist().await
    }

    async fn persist(&self) -> ShelterResult<()> {
        if let Some(ref path) = self.record_path {
            self.record.save(path).await?;
        }
        Ok(())
    }

    async fn journal(&self, event: &str, data: serde_json::Value) {
        match self.journal {
            Some(ref journal) => journal.log(event, &data).await,
            None => {
                if event.ends_with("failed") {
                    warn!("{}: {}", event, data);
                }
            }
        }
    }
}
