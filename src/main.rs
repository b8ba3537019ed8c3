//! Floorwatch main entry point
//!
//! This is the command-line interface for the Floorwatch thread relay.

use anyhow::Context;
use clap::{Parser, Subcommand};
use floorwatch::config::{load_config_with_hash, Config};
use floorwatch::crawler::{build_engine, CrawlControl};
use floorwatch::output::{print_history, print_summary};
use floorwatch::storage::{open_store, CycleStatus, TargetStore};
use floorwatch::CrawlTarget;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Floorwatch: an incremental relay for Bahamut forum threads
///
/// Floorwatch follows forum threads floor by floor, turns every new post
/// into plain text, and archives the posts that pass each thread's score
/// thresholds. Progress is kept per thread, so every run picks up where the
/// last one stopped.
#[derive(Parser, Debug)]
#[command(name = "floorwatch")]
#[command(version = "1.0.0")]
#[command(about = "An incremental relay for Bahamut forum threads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every cycle-interval seconds until interrupted
    ///
    /// The first Ctrl-C pauses after the current target, the second cancels.
    Run {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Run a single crawl cycle
    Once {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Validate the configuration and show what would be crawled
    Check {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// List tracked targets
    List {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Track a thread, or update the thresholds of a tracked one
    Add {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Destination channel
        #[arg(long)]
        channel: u64,

        /// Board id (bsn)
        #[arg(long)]
        board: u64,

        /// Thread id (snA)
        #[arg(long)]
        thread: u64,

        /// Highest floor already handled; ignored for tracked threads
        #[arg(long, default_value_t = 0)]
        last_floor: u32,

        /// Minimum GP a post needs
        #[arg(long, default_value_t = 0)]
        gp: u32,

        /// BP at which a post is dropped (0 disables)
        #[arg(long, default_value_t = 0)]
        bp: u32,
    },

    /// Stop tracking a target
    ///
    /// Targets listed in the config file are added back the next time the
    /// config is loaded.
    Remove {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Target id as shown by `list`
        #[arg(long)]
        id: i64,
    },

    /// Show recent crawl cycles
    History {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Number of cycles to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run { config } => {
            let (config, hash) = load(&config)?;
            handle_run(config, hash, true).await
        }
        Command::Once { config } => {
            let (config, hash) = load(&config)?;
            handle_run(config, hash, false).await
        }
        Command::Check { config } => {
            let (config, _) = load(&config)?;
            handle_check(&config);
            Ok(())
        }
        Command::List { config } => handle_list(&load(&config)?.0),
        Command::Add {
            config,
            channel,
            board,
            thread,
            last_floor,
            gp,
            bp,
        } => {
            let target = CrawlTarget::new(channel, board, thread)
                .with_last_floor(last_floor)
                .with_thresholds(gp, bp);
            handle_add(&load(&config)?.0, &target)
        }
        Command::Remove { config, id } => handle_remove(&load(&config)?.0, id),
        Command::History { config, limit } => handle_history(&load(&config)?.0, limit),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("floorwatch=info,warn"),
            1 => EnvFilter::new("floorwatch=debug,info"),
            2 => EnvFilter::new("floorwatch=trace,debug"),
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

/// Loads and validates the configuration
fn load(path: &Path) -> anyhow::Result<(Config, String)> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, hash))
}

/// Turns Ctrl-C into pause, then cancel
fn spawn_interrupt_handler(control: CrawlControl) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if control.is_paused() {
                tracing::warn!("Cancelling crawl");
                control.cancel();
                break;
            }
            tracing::warn!("Pausing after the current target; press Ctrl-C again to cancel");
            control.pause();
        }
    });
}

/// Handles `run` and `once`
async fn handle_run(config: Config, config_hash: String, repeat: bool) -> anyhow::Result<()> {
    let mut engine = build_engine(&config, &config_hash)?;
    let control = engine.control();
    spawn_interrupt_handler(control.clone());

    let interval = Duration::from_secs(config.crawler.cycle_interval);

    loop {
        // Pick up targets added or removed since the last cycle
        engine.load_targets()?;

        let summary = engine.run_cycle().await.context("Crawl cycle failed")?;
        print_summary(&summary);

        if !repeat || summary.status != CycleStatus::Completed {
            break;
        }

        tracing::info!("Next cycle in {}s", interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = control.interrupted() => {
                tracing::info!("Interrupted while waiting for the next cycle");
                break;
            }
        }
    }

    Ok(())
}

/// Handles `check`: validates config and shows what would be crawled
fn handle_check(config: &Config) {
    println!("=== Floorwatch Configuration ===\n");

    println!("Forum:");
    println!("  Base URL: {}", config.forum.base_url);
    println!("  User agent: {}", config.forum.user_agent);
    println!("  Request timeout: {}s", config.forum.request_timeout);
    println!(
        "  Minimum request interval: {}ms",
        config.forum.min_request_interval
    );

    println!("\nCrawler:");
    println!("  Pages per batch: {}", config.crawler.pages_per_batch);
    println!("  Post delay: {}ms", config.crawler.post_delay);
    println!("  Cycle interval: {}s", config.crawler.cycle_interval);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nOutput:");
    println!("  Archive: {}", config.output.archive_dir);
    println!("  Tags: {}", config.output.tags.join(", "));

    println!("\nSeed Targets ({}):", config.targets.len());
    for entry in &config.targets {
        println!(
            "  - channel {} bsn={} snA={} from floor {} (GP >= {}, BP limit {})",
            entry.channel_id,
            entry.board_id,
            entry.thread_id,
            entry.last_floor.saturating_add(1),
            entry.gp_threshold,
            entry.bp_threshold
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles `list`: prints the tracked targets
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let targets = store.load_targets()?;

    if targets.is_empty() {
        println!("No targets tracked.");
        return Ok(());
    }

    println!(
        "{:>4}  {:>12}  {:>8}  {:>10}  {:>10}  {:>4}  {:>4}",
        "ID", "Channel", "Board", "Thread", "Last floor", "GP", "BP"
    );
    for target in targets {
        println!(
            "{:>4}  {:>12}  {:>8}  {:>10}  {:>10}  {:>4}  {:>4}",
            target.id,
            target.channel_id,
            target.board_id,
            target.thread_id,
            target.last_floor,
            target.gp_threshold,
            target.bp_threshold
        );
    }

    Ok(())
}

/// Handles `add`
fn handle_add(config: &Config, target: &CrawlTarget) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let id = store.upsert_target(target)?;
    println!("✓ Tracking {} as target {}", target.label(), id);
    Ok(())
}

/// Handles `remove`
fn handle_remove(config: &Config, id: i64) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let target = store
        .get_target(id)?
        .with_context(|| format!("No target with id {}", id))?;

    store
        .remove_target(id)
        .with_context(|| format!("Failed to remove target {}", id))?;
    println!("✓ Removed target {} ({})", id, target.label());

    let seeded = config.targets.iter().any(|entry| {
        entry.channel_id == target.channel_id
            && entry.board_id == target.board_id
            && entry.thread_id == target.thread_id
    });
    if seeded {
        println!("  Note: it is listed in the config file and returns on the next load");
    }
    Ok(())
}

/// Handles `history`
fn handle_history(config: &Config, limit: usize) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let cycles = store.recent_cycles(limit)?;
    print_history(&cycles);
    Ok(())
}
