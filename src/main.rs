//! Thread-Harvest main entry point
//!
//! This is the command-line interface for the Thread-Harvest thread collector.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use thread_harvest::config::{load_config_with_hash, validate, Config, DelayWindow};
use thread_harvest::crawler::{harvest, Harvester};
use tracing_subscriber::EnvFilter;

/// Thread-Harvest: collects every entry of a paginated forum thread
///
/// The last page is worked out from pager links and, when those are
/// inconclusive, a bounded walk over the following pages. Every page is then
/// fetched in order and its entries are written to one text file.
#[derive(Parser, Debug)]
#[command(name = "thread-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Collects every entry of a paginated forum thread", long_about = None)]
struct Cli {
    /// Thread URL (overrides [source] url from the config file)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Attempts per client identity
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Lower bound of the delay between pages (milliseconds)
    #[arg(long, value_name = "MS")]
    delay_min_ms: Option<u64>,

    /// Upper bound of the delay between pages (milliseconds)
    #[arg(long, value_name = "MS")]
    delay_max_ms: Option<u64>,

    /// Directory receiving the result file
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Maximum number of pages probed by the sequential walk
    #[arg(long, value_name = "N")]
    max_seq_walk: Option<u32>,

    /// Collect at most this many pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without any request
    #[arg(long, conflicts_with = "discover_only")]
    dry_run: bool,

    /// Discover and print the last page, then exit
    #[arg(long, conflicts_with = "dry_run")]
    discover_only: bool,
}

impl Cli {
    /// Layers command-line values over the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.source.url = Some(url.trim().to_string());
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.fetch.retries_per_identity = retries;
        }

        let between = config.pacing.between_pages;
        config.pacing.between_pages = DelayWindow::new(
            self.delay_min_ms.unwrap_or(between.min_ms),
            self.delay_max_ms.unwrap_or(between.max_ms),
        );

        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(walk) = self.max_seq_walk {
            config.discovery.max_seq_walk = walk;
        }
        if self.max_pages.is_some() {
            config.output.max_pages = self.max_pages;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.discover_only {
        handle_discover_only(config).await
    } else {
        handle_harvest(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("thread_harvest=info,warn"),
            1 => EnvFilter::new("thread_harvest=debug,info"),
            2 => EnvFilter::new("thread_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let harvester = Harvester::new(config.clone())?;
    let thread = harvester.thread();

    println!("=== Thread-Harvest Dry Run ===\n");

    println!("Thread:");
    println!("  Base: {}", thread);
    println!("  Page parameter: {}", thread.page_param());
    println!("  First page: {}", thread.page_url(1));
    println!("  Output slug: {}", thread.slug());

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Attempts per identity: {}",
        config.fetch.retries_per_identity
    );
    println!(
        "  Backoff: {}ms doubling, capped at {}ms, jitter {}-{}ms",
        config.fetch.backoff_base_ms,
        config.fetch.backoff_cap_ms,
        config.fetch.jitter.min_ms,
        config.fetch.jitter.max_ms
    );

    println!("\nPacing:");
    println!(
        "  Between pages: {}-{}ms",
        config.pacing.between_pages.min_ms, config.pacing.between_pages.max_ms
    );
    println!(
        "  Walk step: {}-{}ms",
        config.pacing.walk_step.min_ms, config.pacing.walk_step.max_ms
    );

    println!("\nDiscovery:");
    println!(
        "  Link evidence threshold: {}",
        config.discovery.link_evidence_threshold
    );
    println!("  Walk cap: {} pages", config.discovery.max_seq_walk);
    println!(
        "  Fallback last page: {}",
        config.discovery.fallback_last_page
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir);
    match config.output.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --discover-only mode: prints the last page and exits
async fn handle_discover_only(config: Config) -> anyhow::Result<()> {
    let harvester = Harvester::new(config)?;
    let last = harvester.discover_last_page().await;

    match &last.report {
        Some(report) => {
            println!("Last page: {}", report.last_page);
            println!("  Highest linked page: {}", report.max_observed_page);
            println!(
                "  Pages inspected for links: {:?}",
                report.pages_inspected_for_links
            );
            if let Some(stop) = report.walk_stop {
                println!("  Walk stop: {:?}", stop);
            }
        }
        None => println!("Last page: {} (fallback, discovery failed)", last.page),
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    let summary = match harvest(config).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Harvest setup failed: {}", e);
            return Err(e.into());
        }
    };

    summary.print();

    Ok(())
}
