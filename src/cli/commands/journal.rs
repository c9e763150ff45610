//! Journal command - show recent lifecycle events

use crate::cli::args::JournalArgs;
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::journal::Journal;
use console::style;

/// Execute the journal command
pub async fn execute(args: JournalArgs, config: &Config) -> ShelterResult<()> {
    let journal = Journal::new(config);
    let entries = journal
        .tail(args.lines)
        .await
        .map_err(|e| ShelterError::io(format!("reading {}", journal.path().display()), e))?;

    if entries.is_empty() {
        println!("No journal entries.");
        if !config.general.journal {
            println!("Journal is disabled (general.journal = false).");
        }
        return Ok(());
    }

    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &serde_json::Value) -> String {
    let timestamp = entry["timestamp"].as_str().unwrap_or("-");
    let event = entry["event"].as_str().unwrap_or("?");
    format!(
        "{} {} {}",
        style(timestamp).dim(),
        style(event).bold(),
        entry["data"]
    )
}
