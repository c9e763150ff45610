//! Background sync routines
//!
//! The sync handler only checks the tag; what "synchronizing data" means
//! is up to the deployment. [`CommandSync`] hands it to an external
//! program, [`NoopSync`] does nothing.

use crate::config::schema::SyncConfig;
use crate::error::{ShelterError, ShelterResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// Environment variable carrying the sync tag to the command
pub const SYNC_TAG_ENV: &str = "SHELTER_SYNC_TAG";

/// Deferred data synchronization
#[async_trait]
pub trait SyncRoutine: Send + Sync {
    async fn run(&self, tag: &str) -> ShelterResult<()>;
}

/// Routine used when nothing is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSync;

#[async_trait]
impl SyncRoutine for NoopSync {
    async fn run(&self, tag: &str) -> ShelterResult<()> {
        info!("Sync '{}' fired but no sync command is configured", tag);
        Ok(())
    }
}

/// Runs an external command for each sync
#[derive(Debug, Clone)]
pub struct CommandSync {
    program: String,
    args: Vec<String>,
}

impl CommandSync {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl SyncRoutine for CommandSync {
    async fn run(&self, tag: &str) -> ShelterResult<()> {
        debug!("Running sync command {} {:?}", self.program, self.args);

        let output = Command::new(&self.program)
            .args(&self.args)
            .env(SYNC_TAG_ENV, tag)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ShelterError::command_failed(&self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShelterError::SyncFailed {
                tag: tag.to_string(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        info!("Sync '{}' completed", tag);
        Ok(())
    }
}

/// Build the routine selected by config
pub fn create_sync_routine(config: &SyncConfig) -> Arc<dyn SyncRoutine> {
    match config.command.split_first() {
        Some((program, args)) => Arc::new(CommandSync::new(program.clone(), args.to_vec())),
        None => Arc::new(NoopSync),
    }
}
