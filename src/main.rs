//! Reddot-Folio main entry point
//!
//! This is the command-line interface for the Reddot-Folio design collector.

use anyhow::{bail, Context};
use clap::Parser;
use reddot_folio::config::{load_config_with_hash, Config};
use reddot_folio::crawler::Coordinator;
use reddot_folio::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reddot-Folio: a paginated design-award collector
///
/// Reddot-Folio crawls the award search API category by category, enriches
/// every design with its detail page and image, keeps a CSV of everything
/// collected, and packages each category into one numbered document.
#[derive(Parser, Debug)]
#[command(name = "reddot-folio")]
#[command(version)]
#[command(about = "A paginated design-award collector", long_about = None)]
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

    /// Only crawl the named category (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    categories: Vec<String>,

    /// Free-text search term, overriding the configured keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reddot_folio=info,warn"),
            1 => EnvFilter::new("reddot_folio=debug,info"),
            2 => EnvFilter::new("reddot_folio=trace,debug"),
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

/// Applies `--category` and `--keyword` to the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(keyword) = &cli.keyword {
        config.crawl.keyword = Some(keyword.clone());
    }

    if !cli.categories.is_empty() {
        for name in &cli.categories {
            if !config.categories.iter().any(|c| &c.name == name) {
                bail!("unknown category '{}'", name);
            }
        }
        config
            .categories
            .retain(|c| cli.categories.contains(&c.name));
    }

    Ok(())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Reddot-Folio Dry Run ===\n");

    println!("Search API:");
    println!("  Endpoint: {}", config.api.base_url);
    println!("  Site: {}", config.api.site_base_url);
    println!("  User agent: {}", config.api.user_agent);

    println!("\nRetry:");
    println!("  Attempts: {}", config.retry.max_attempts);
    println!("  Delay: {}ms", config.retry.delay_ms);
    println!("  Timeout: {}s", config.retry.timeout_secs);

    println!("\nCrawl:");
    println!("  Workers: {}", config.crawl.max_workers);
    match config.crawl.keyword.as_deref().map(str::trim) {
        Some(keyword) if !keyword.is_empty() => println!("  Keyword: {}", keyword),
        _ => println!("  Keyword: (none)"),
    }
    if config.crawl.max_pages > 0 {
        println!("  Page limit: {}", config.crawl.max_pages);
    }

    println!("\nCategories ({}):", config.categories.len());
    for category in &config.categories {
        println!(
            "  - {} -> {}",
            category.name,
            config.output.category_root(&category.name).display()
        );
        for filter in &category.filters {
            println!("    * {}", filter);
        }
    }

    println!("\nConfiguration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} categories into {}",
        config.categories.len(),
        config.output.root_dir
    );

    let coordinator = Coordinator::new(config).context("failed to set up crawler")?;
    let stats = coordinator.run().await.context("crawl failed")?;

    print_statistics(&stats);

    let aborted: Vec<&str> = stats
        .iter()
        .filter(|s| s.outcome.is_aborted())
        .map(|s| s.category.as_str())
        .collect();
    if !aborted.is_empty() {
        bail!("categories aborted during setup: {}", aborted.join(", "));
    }

    Ok(())
}
