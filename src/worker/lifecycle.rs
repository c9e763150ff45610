//! Worker lifecycle state and its persisted record

use crate::error::{ShelterError, ShelterResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// Worker lifecycle states
///
/// `installing → installed → activating → activated`, with `redundant`
/// reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Install handler running
    Installing,
    /// Precache complete, waiting to activate
    Installed,
    /// Activate handler running
    Activating,
    /// Active and controlling clients
    Activated,
    /// Failed to install, or superseded
    Redundant,
}

impl WorkerState {
    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Installing | Installed | Activating | Activated, Redundant)
        )
    }

    /// Only an activated worker intercepts fetches
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, Self::Activated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Persisted worker record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Unique worker ID, new for every install attempt
    pub id: Uuid,

    /// Cache bucket name this worker owns
    pub version: String,

    /// Current lifecycle state
    pub state: WorkerState,

    /// When the install attempt started
    pub created_at: DateTime<Utc>,

    /// When precaching completed
    pub installed_at: Option<DateTime<Utc>>,

    /// When activation completed
    pub activated_at: Option<DateTime<Utc>>,

    /// Whether the worker took control of open clients
    pub clients_claimed: bool,
}

impl WorkerRecord {
    /// Create a record for a worker about to install
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: version.into(),
            state: WorkerState::Installing,
            created_at: Utc::now(),
            installed_at: None,
            activated_at: None,
            clients_claimed: false,
        }
    }

    /// Move to `next`, stamping the matching timestamp
    pub fn transition(&mut self, next: WorkerState) -> ShelterResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ShelterError::InvalidState {
                expected: expected_before(next).to_string(),
                actual: self.state,
            });
        }

        match next {
            WorkerState::Installed => self.installed_at = Some(Utc::now()),
            WorkerState::Activated => self.activated_at = Some(Utc::now()),
            WorkerState::Redundant => self.clients_claimed = false,
            _ => {}
        }
        self.state = next;
        Ok(())
    }

    /// Load a record, `None` if the file does not exist
    pub async fn load(path: &Path) -> ShelterResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShelterError::io(format!("reading worker record {}", path.display()), e))?;

        let record: WorkerRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record
    pub async fn save(&self, path: &Path) -> ShelterResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShelterError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| ShelterError::io(format!("writing worker record {}", path.display()), e))?;

        Ok(())
    }
}

fn expected_before(next: WorkerState) -> &'static str {
    match next {
        WorkerState::Installing => "none",
        WorkerState::Installed => "installing",
        WorkerState::Activating => "installed",
        WorkerState::Activated => "activating",
        WorkerState::Redundant => "non-redundant",
    }
}
