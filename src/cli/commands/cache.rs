//! Cache command - inspect and clear cache buckets

use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::{open_storage, record_path};
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::storage::disk::{format_bytes, BucketRecord};
use crate::storage::{CacheStorage, DiskStorage};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ShelterResult<()> {
    let storage = open_storage(config).await?;

    match args.action {
        CacheAction::List { format } => list_buckets(&storage, config, format).await,
        CacheAction::Show { bucket } => show_bucket(&storage, &bucket).await,
        CacheAction::Clear { yes } => clear_buckets(&storage, config, yes).await,
    }
}

#[derive(Debug, Serialize)]
struct BucketSummary {
    name: String,
    entries: usize,
    bytes: u64,
    current: bool,
    created_at: String,
}

async fn summarize(
    storage: &DiskStorage,
    record: &BucketRecord,
    current: &str,
) -> ShelterResult<BucketSummary> {
    Ok(BucketSummary {
        name: record.name.clone(),
        entries: storage.entries(&record.name).await?.len(),
        bytes: storage.usage(&record.name).await?,
        current: record.name == current,
        created_at: record.created_at.to_rfc3339(),
    })
}

/// List all buckets
async fn list_buckets(
    storage: &DiskStorage,
    config: &Config,
    format: OutputFormat,
) -> ShelterResult<()> {
    let records = storage.records().await?;

    if records.is_empty() {
        if !matches!(format, OutputFormat::Json) {
            println!("No cache buckets found.");
        } else {
            println!("[]");
        }
        return Ok(());
    }

    let mut summaries = Vec::with_capacity(records.len());
    for record in &records {
        summaries.push(summarize(storage, record, &config.worker.version).await?);
    }

    match format {
        OutputFormat::Table => print_table(&summaries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            for summary in &summaries {
                println!("{}", summary.name);
            }
        }
    }

    Ok(())
}

fn print_table(summaries: &[BucketSummary]) {
    println!(
        "{:<30} {:<8} {:<10} {:<10} {:<20}",
        "BUCKET", "ENTRIES", "SIZE", "STATE", "CREATED"
    );
    println!("{}", "-".repeat(80));

    for summary in summaries {
        let state = if summary.current {
            style("current").green().to_string()
        } else {
            style("stale").yellow().to_string()
        };
        let created = chrono::DateTime::parse_from_rfc3339(&summary.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| summary.created_at.clone());

        println!(
            "{:<30} {:<8} {:<10} {:<10} {:<20}",
            summary.name,
            summary.entries,
            format_bytes(summary.bytes),
            state,
            created
        );
    }

    let total: u64 = summaries.iter().map(|s| s.bytes).sum();
    println!();
    println!(
        "Total: {} bucket(s), {}",
        summaries.len(),
        format_bytes(total)
    );
}

/// List the URLs stored in one bucket
async fn show_bucket(storage: &DiskStorage, bucket: &str) -> ShelterResult<()> {
    if !storage.has(bucket).await? {
        return Err(ShelterError::BucketNotFound(bucket.to_string()));
    }

    let entries = storage.entries(bucket).await?;
    if entries.is_empty() {
        println!("Bucket {} is empty.", bucket);
        return Ok(());
    }

    for url in &entries {
        match storage.lookup(bucket, url).await? {
            Some(response) => println!(
                "{:<4} {:<10} {}",
                response.status,
                format_bytes(response.body.len() as u64),
                url
            ),
            None => println!("{:<4} {:<10} {}", "?", "-", url),
        }
    }
    println!();
    println!("Total: {} entries", entries.len());
    Ok(())
}

/// Delete every bucket and the worker record that depended on them
async fn clear_buckets(storage: &DiskStorage, config: &Config, yes: bool) -> ShelterResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let buckets = storage.keys().await?;

    if buckets.is_empty() {
        ui::step_info(&ctx, "No cache buckets to clear");
        return Ok(());
    }

    let confirmed = ui::confirm(
        &ctx,
        &format!("Delete {} cache bucket(s)?", buckets.len()),
        false,
    )
    .await?;
    if !confirmed {
        ui::step_warn_hint(&ctx, "Nothing deleted", "Use --yes to skip confirmation");
        return Ok(());
    }

    for bucket in &buckets {
        match storage.delete(bucket).await {
            Ok(_) => ui::step_ok_detail(&ctx, "Deleted", bucket),
            Err(e) => ui::step_error_detail(&ctx, &format!("Failed to delete {}", bucket), &e.to_string()),
        }
    }

    let record = record_path(config);
    match fs::remove_file(&record).await {
        Ok(()) => debug!("Removed worker record {}", record.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ShelterError::io(
                format!("removing {}", record.display()),
                e,
            ))
        }
    }

    ui::outro_success(&ctx, "Caches cleared; run shelter install to precache again");
    Ok(())
}
