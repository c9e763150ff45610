//! Shelter - offline-first cache controller
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shelter::cli::{commands, Cli, Commands};
use shelter::config::schema::LogFormat;
use shelter::config::{Config, ConfigManager};
use shelter::error::{ShelterError, ShelterResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ShelterResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Find local config unless --no-local is set or a path was given
    let local_config_path = if cli.no_local || cli.config.is_some() {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| ShelterError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_preferring(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    if let Some(ref path) = local_config_path {
        debug!("Loaded local config: {}", path.display());
    }

    match cli.command {
        Commands::Install => commands::install(&config).await,
        Commands::Activate => commands::activate(&config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Push(args) => commands::push(args, &config).await,
        Commands::Sync(args) => commands::sync(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Journal(args) => commands::journal(args, &config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug; logs go to stderr
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("shelter=warn"),
        1 => EnvFilter::new("shelter=info"),
        _ => EnvFilter::new("shelter=debug"),
    };

    if config.general.log_format == LogFormat::Json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}
