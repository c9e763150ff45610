//! Install command - precache the manifest and activate

use crate::cli::open_host;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::ActivateReport;

/// Execute the install command
pub async fn execute(config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let mut host = open_host(config, false).await?;
    let version = host.controller().config().cache_name.clone();
    let total = host.controller().config().manifest.len();

    ui::intro(&ctx, &format!("Installing {}", version));

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Precaching {} assets...", total));
    let report = match host.start().await {
        Ok(report) => report,
        Err(e) => {
            spinner.stop_error("Precache failed, nothing was cached");
            return Err(e);
        }
    };
    let verb = if report.install.created {
        "Cached"
    } else {
        "Refreshed"
    };
    spinner.stop(&format!(
        "{} {} assets in {}",
        verb,
        report.install.cached.len(),
        report.install.cache_name
    ));

    if let Some(ref activate) = report.activate {
        print_activation(&ctx, activate);
    }

    ui::outro_success(&ctx, &format!("Worker {} is {}", version, host.state()));
    Ok(())
}

/// Report stale-bucket cleanup
pub(crate) fn print_activation(ctx: &UiContext, report: &ActivateReport) {
    if report.deleted.is_empty() && report.failed.is_empty() {
        ui::step_ok(ctx, "No stale caches");
    }
    for bucket in &report.deleted {
        ui::step_ok_detail(ctx, "Deleted stale cache", bucket);
    }
    for (bucket, reason) in &report.failed {
        ui::step_error_detail(ctx, &format!("Could not delete {}", bucket), reason);
    }
    if report.claim_clients {
        ui::step_info(ctx, "Claimed open clients");
    }
}
