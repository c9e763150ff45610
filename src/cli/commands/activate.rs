//! Activate command - delete stale buckets and claim clients

use crate::cli::commands::install::print_activation;
use crate::cli::open_host;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{self, UiContext};

/// Execute the activate command
pub async fn execute(config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let mut host = open_host(config, false).await?;

    let report = host.activate().await?;
    print_activation(&ctx, &report);
    ui::outro_success(
        &ctx,
        &format!("Worker {} is {}", report.cache_name, host.state()),
    );
    Ok(())
}
