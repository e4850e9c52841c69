//! numwatch main entry point
//!
//! This is the command-line interface for the numwatch change monitor.

use anyhow::Context;
use clap::Parser;
use numwatch::config::{load_config_with_hash, Config};
use numwatch::storage::{open_store, MemoryStore, SourceStore};
use numwatch::{LogNotifier, Monitor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// numwatch: watches pages that publish numbers and reports what is new
///
/// numwatch polls each configured source, extracts its numbers with a
/// cascade of strategies, and announces entries that appeared since the
/// last observation.
#[derive(Parser, Debug)]
#[command(name = "numwatch")]
#[command(version = "1.0.0")]
#[command(about = "Change monitor for number listing pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single polling cycle and exit
    #[arg(long, conflicts_with_all = ["dry_run", "show_state"])]
    once: bool,

    /// Validate config and show the sources without polling
    #[arg(long, conflicts_with_all = ["once", "show_state"])]
    dry_run: bool,

    /// Show the persisted state of every source and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    show_state: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.show_state {
        handle_show_state(&config)
    } else {
        handle_monitor(config, cli.once).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("numwatch=info,warn"),
            1 => EnvFilter::new("numwatch=debug,info"),
            2 => EnvFilter::new("numwatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and lists the sources
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== numwatch Dry Run ===\n");

    println!("Polling:");
    println!("  Check interval: {}s", config.monitor.check_interval);
    println!("  Pause between sources: {}ms", config.monitor.source_pause);
    println!(
        "  Fetch: {} attempts, {}ms timeout, {}ms between attempts",
        config.fetch.max_attempts, config.fetch.timeout, config.fetch.retry_delay
    );

    println!("\nRepeat notifications:");
    if config.repeat.enabled {
        println!("  Enabled, every {}s", config.repeat.interval);
    } else {
        println!("  Disabled");
    }
    println!("  Single mode: {}", config.notify.single_mode);
    println!("  Keyed API: {}", if config.api.is_some() { "configured" } else { "off" });

    println!("\nSources ({}):", config.source.len());
    let monitor = Monitor::new(config, Box::new(MemoryStore::new()), Arc::new(LogNotifier::new()))
        .context("failed to build monitor")?;
    for id in monitor.registry().ids() {
        if let Some(source) = monitor.source(id) {
            let kind = source
                .kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "auto".to_string());
            let interval = source
                .check_interval
                .map(|d| format!(", every {}s", d.as_secs()))
                .unwrap_or_default();
            let state = if source.enabled { "" } else { " (disabled)" };
            println!("  - {} [{}{}]{}: {}", source.id, kind, interval, state, source.url);
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --show-state mode: prints persisted source state
fn handle_show_state(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_store(Path::new(&config.storage.database_path))
        .context("failed to open database")?;
    let snapshots = store.load_all()?;

    if snapshots.is_empty() {
        println!("No saved state.");
        return Ok(());
    }

    for snapshot in snapshots {
        println!("{}", snapshot.source_id);
        println!("  Last value:     {}", snapshot.last_value.as_deref().unwrap_or("-"));
        println!(
            "  Previous value: {}",
            snapshot.previous_last_value.as_deref().unwrap_or("-")
        );
        if !snapshot.latest_values.is_empty() {
            println!("  Latest list:    {}", snapshot.latest_values.join(", "));
        }
        if let Some(flag) = &snapshot.flag_url {
            println!("  Flag:           {}", flag);
        }
        if let Some(updated_at) = snapshot.updated_at {
            println!("  Updated:        {}", updated_at.to_rfc3339());
        }
    }

    Ok(())
}

/// Handles the main monitoring operation
async fn handle_monitor(config: Config, once: bool) -> anyhow::Result<()> {
    let store: Box<dyn SourceStore> = Box::new(
        open_store(Path::new(&config.storage.database_path)).context("failed to open database")?,
    );
    let monitor = Monitor::new(&config, store, Arc::new(LogNotifier::new()))?;

    tracing::info!(
        "Sources: {}, check interval: {}s",
        config.source.len(),
        config.monitor.check_interval
    );

    if once {
        let report = monitor.run_cycle().await;
        tracing::info!(
            checked = report.checked,
            changed = report.changed,
            notified = report.notified,
            "single cycle finished"
        );
        return Ok(());
    }

    tokio::select! {
        _ = monitor.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            tracing::info!("Shutting down");
            monitor.stop_repeat();
        }
    }

    Ok(())
}
