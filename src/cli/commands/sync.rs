//! Sync command - deliver a background sync signal

use crate::cli::args::SyncArgs;
use crate::cli::open_host;
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::ui::{self, UiContext};
use crate::worker::{Event, EventOutcome, SyncOutcome};

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let mut host = open_host(config, false).await?;

    match host.handle(Event::Sync(args.tag.clone())).await? {
        EventOutcome::Synced(SyncOutcome::Completed) => {
            ui::step_ok_detail(&ctx, "Sync completed", &args.tag);
        }
        EventOutcome::Synced(SyncOutcome::Ignored) => {
            ui::step_warn_hint(
                &ctx,
                &format!("Ignored sync tag '{}'", args.tag),
                &format!("this worker syncs on '{}'", config.worker.sync_tag),
            );
        }
        other => {
            return Err(ShelterError::Internal(format!(
                "sync produced {:?}",
                other
            )))
        }
    }
    Ok(())
}
