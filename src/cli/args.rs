//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shelter - offline-first cache controller for progressive web apps
///
/// Precaches an app's static assets, serves them cache-first, and falls
/// back to an offline page when navigation cannot reach the network.
#[derive(Parser, Debug)]
#[command(name = "shelter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local shelter.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Precache the asset manifest and activate the worker
    Install,

    /// Delete stale cache buckets and take control of clients
    Activate,

    /// Route one request through the worker and print the response body
    Fetch(FetchArgs),

    /// Deliver a push message
    Push(PushArgs),

    /// Deliver a background sync signal
    Sync(SyncArgs),

    /// Show worker state and cache coverage
    Status,

    /// Show recent lifecycle events
    Journal(JournalArgs),

    /// Inspect or clear cache buckets
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Request URL (relative URLs resolve against network.origin)
    pub url: String,

    /// Send as a top-level navigation
    #[arg(short, long)]
    pub navigate: bool,

    /// Accept header value
    #[arg(long)]
    pub accept: Option<String>,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Treat the network as unreachable for this request
    #[arg(long)]
    pub offline: bool,

    /// Print status line and headers before the body
    #[arg(short, long)]
    pub include_headers: bool,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Text payload (omit to send an empty push)
    pub payload: Option<String>,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Sync tag
    pub tag: String,
}

/// Arguments for the journal command
#[derive(Parser, Debug)]
pub struct JournalArgs {
    /// Number of entries to show (0 = all)
    #[arg(short = 'n', long, default_value = "20")]
    pub lines: usize,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache buckets
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the URLs stored in a bucket
    Show {
        /// Bucket name
        bucket: String,
    },

    /// Delete every bucket and forget the worker
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
