//! Push command - deliver a push message

use crate::cli::args::PushArgs;
use crate::cli::open_host;
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::worker::{Event, EventOutcome};
use tracing::debug;

/// Execute the push command
pub async fn execute(args: PushArgs, config: &Config) -> ShelterResult<()> {
    let mut host = open_host(config, false).await?;

    match host.handle(Event::Push(args.payload)).await? {
        EventOutcome::Notified(notification) => {
            debug!("Displayed notification '{}'", notification.title);
            Ok(())
        }
        other => Err(ShelterError::Internal(format!("push produced {:?}", other))),
    }
}
