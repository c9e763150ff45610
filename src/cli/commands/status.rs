//! Status command - worker state and cache coverage

use crate::cli::open_host;
use crate::config::{Config, ConfigManager};
use crate::error::ShelterResult;
use crate::ui::{self, UiContext};
use crate::worker::{WorkerHost, WorkerState};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let host = open_host(config, false).await?;
    let record = host.record();

    println!("{}", style("Shelter Status").bold().cyan());

    ui::section(&ctx, "Worker:");
    ui::key_value(&ctx, "Version", &record.version);
    ui::key_value_status(
        &ctx,
        "State",
        &record.state.to_string(),
        record.state == WorkerState::Activated,
    );
    if record.state != WorkerState::Installing {
        ui::key_value(&ctx, "Id", &record.id.to_string());
    }
    if let Some(at) = record.installed_at {
        ui::key_value(&ctx, "Installed", &at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(at) = record.activated_at {
        ui::key_value(&ctx, "Activated", &at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if record.clients_claimed {
        ui::key_value(&ctx, "Clients", "claimed");
    }

    ui::section(&ctx, "Network:");
    ui::key_value(&ctx, "Backend", host.controller().network().name());
    match config.network.root {
        Some(ref root) => ui::key_value(&ctx, "Root", &root.display().to_string()),
        None => ui::key_value(&ctx, "Origin", &config.network.origin),
    }

    println!();
    let all_ok = check_cache(&host).await?;

    println!();
    println!(
        "  State dir: {}",
        style(ConfigManager::resolve_state_dir(config).display()).dim()
    );
    println!();
    if all_ok {
        println!("{}", style("Ready to serve offline").green().bold());
    } else {
        println!(
            "{}",
            style("Not ready for offline use - run: shelter install")
                .yellow()
                .bold()
        );
    }

    Ok(())
}

/// Print bucket coverage; true when every manifest URL is cached
async fn check_cache(host: &WorkerHost) -> ShelterResult<bool> {
    let controller = host.controller();
    let storage = controller.storage();
    let bucket = &controller.config().cache_name;
    let manifest = &controller.config().manifest;

    println!("{}", style("Cache:").bold());

    let buckets = storage.keys().await?;
    for stale in buckets.iter().filter(|name| *name != bucket) {
        println!("  {}Stale bucket {}", WARN, stale);
    }

    if !storage.has(bucket).await? {
        println!("  {}Bucket {} missing", CROSS, bucket);
        return Ok(false);
    }

    let entries = storage.entries(bucket).await?;
    let missing: Vec<&String> = manifest
        .urls()
        .iter()
        .filter(|url| !entries.contains(url))
        .collect();

    if missing.is_empty() {
        println!(
            "  {}Bucket {} holds all {} manifest URLs",
            CHECK,
            bucket,
            manifest.len()
        );
    } else {
        println!(
            "  {}Bucket {} is missing {} of {} manifest URLs",
            CROSS,
            bucket,
            missing.len(),
            manifest.len()
        );
        for url in &missing {
            println!("      {}", style(url).dim());
        }
    }

    let offline_cached = entries.iter().any(|url| url == manifest.offline_url());
    if offline_cached {
        println!("  {}Offline page {}", CHECK, manifest.offline_url());
    } else {
        println!("  {}Offline page {} not cached", CROSS, manifest.offline_url());
    }

    Ok(missing.is_empty() && offline_cached)
}
