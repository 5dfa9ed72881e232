//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sitemapper::config::{load_config_with_hash, Config};
use sitemapper::crawler::crawl_with_config;
use sitemapper::output::{print_statistics, print_tree, CrawlStatistics};
use sitemapper::url::parse_root;
use tracing_subscriber::EnvFilter;

/// Sitemapper: maps every page of a single website
///
/// Sitemapper crawls all pages reachable from ROOT on the same host and prints
/// the links between them as an indented tree.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "Maps the pages of a single website", long_about = None)]
struct Cli {
    /// Absolute URL the crawl starts from
    #[arg(value_name = "ROOT")]
    root: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print crawl statistics after the tree
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout only carries the site map.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_configuration(cli.config.as_ref())?;

    let root = parse_root(&cli.root)
        .with_context(|| format!("Can't parse root address '{}'", cli.root))?;

    let started = std::time::Instant::now();
    let site_map = crawl_with_config(root, &config)
        .await
        .context("Crawl failed")?;

    tracing::info!(
        "Crawl completed: {} pages mapped in {:?}",
        site_map.len(),
        started.elapsed()
    );

    print_tree(&site_map).context("Failed to write site map")?;

    if cli.stats {
        println!();
        print_statistics(&CrawlStatistics::from_site_map(&site_map))
            .context("Failed to write statistics")?;
    }

    Ok(())
}

/// Loads the configuration file if one was given, otherwise the defaults
fn load_configuration(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}
