//! Jobtrawl main entry point
//!
//! This is the command-line interface for the Jobtrawl job-listing crawler.

use anyhow::Context;
use clap::Parser;
use jobtrawl::config::{load_config_with_hash, Config};
use jobtrawl::crawler::start_crawl;
use jobtrawl::output::{
    export_json_lines_to_path, load_statistics, persist_crawl, print_statistics, RecordSink,
    SqliteSink,
};
use jobtrawl::storage::{RunStatus, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Jobtrawl: a job-listing crawler
///
/// Jobtrawl walks the paginated search results of a job site, follows every
/// job-detail link, and stores one normalized record per job.
#[derive(Parser, Debug)]
#[command(name = "jobtrawl")]
#[command(version = "1.0.0")]
#[command(about = "A job-listing crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show statistics for the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Write the latest run's records as JSON Lines to PATH and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats"])]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = &cli.export {
        handle_export(&config, path)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jobtrawl=info,warn"),
            1 => EnvFilter::new("jobtrawl=debug,info"),
            2 => EnvFilter::new("jobtrawl=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Jobtrawl Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Start pages ({}):", config.site.start_urls.len());
    for url in &config.site.start_urls {
        println!("    * {}", url);
    }

    println!("\nCrawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    match config.crawler.max_listing_pages {
        Some(max) => println!("  Max listing pages: {}", max),
        None => println!("  Max listing pages: unlimited"),
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nListing Selectors:");
    println!("  Result entry: {}", config.listing.item);
    println!(
        "  Detail link: {} (text contains {:?})",
        config.listing.detail_link, config.listing.detail_link_marker
    );
    println!(
        "  Next page: {} (text contains {:?})",
        config.listing.next_page, config.listing.next_page_marker
    );

    let rules = config.rule_set();
    println!("\nExtraction Rules ({}):", rules.rules.len());
    for rule in &rules.rules {
        println!("  - {}: {}", rule.field, rule.selector);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes the latest run's records as JSON Lines
fn handle_export(config: &Config, path: &Path) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run = storage
        .get_latest_run()?
        .context("No crawl runs found in database")?;

    let count = export_json_lines_to_path(&storage, run.id, path)?;
    println!(
        "✓ Exported {} record(s) from run {} to: {}",
        count,
        run.id,
        path.display()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;
    let run_id = storage.create_run(config_hash)?;
    tracing::info!("Starting run {}", run_id);

    let storage: Arc<Mutex<dyn Storage + Send>> = Arc::new(Mutex::new(storage));
    let sink = SqliteSink::new(storage, run_id);

    let (cancel, handle, events) = match start_crawl(config, 64) {
        Ok(parts) => parts,
        Err(e) => {
            sink.finalize(RunStatus::Failed)?;
            return Err(e.into());
        }
    };

    match persist_crawl(&sink, cancel, handle, events, tokio::signal::ctrl_c()).await {
        Ok(_) => {
            print_statistics(&sink.generate_summary()?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
