//! Conference Harvester main entry point
//!
//! This is the command-line interface for the conference proceedings scraper.

use anyhow::Context;
use clap::Parser;
use conference_harvester::config::{load_config_with_hash, Config, ConfigOverrides};
use conference_harvester::crawler::{harvest, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Conference Harvester: a polite conference proceedings scraper
///
/// Walks a static conference website (session index, session listings,
/// paper pages), stores paper metadata as JSON/CSV/TXT per session and
/// downloads the paper PDFs. Re-running resumes: PDFs already on disk are
/// not fetched again.
#[derive(Parser, Debug)]
#[command(name = "conference-harvester")]
#[command(version)]
#[command(about = "A polite conference proceedings scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Conference site base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Attempts per request, the first one included
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Minimum delay between requests in seconds
    #[arg(long, value_name = "SECS")]
    delay_min: Option<f64>,

    /// Maximum delay between requests in seconds
    #[arg(long, value_name = "SECS")]
    delay_max: Option<f64>,

    /// Only process the first N sessions (quick test runs)
    #[arg(long, value_name = "N")]
    limit_sessions: Option<usize>,

    /// Collect metadata without downloading PDFs
    #[arg(long)]
    skip_pdfs: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            output_dir: self.output_dir.clone(),
            max_retries: self.max_retries,
            request_timeout_secs: self.timeout,
            delay_min_secs: self.delay_min,
            delay_max_secs: self.delay_max,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    cli.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config, &cli);
        return Ok(());
    }

    let options = RunOptions {
        limit_sessions: cli.limit_sessions,
        skip_pdfs: cli.skip_pdfs,
        config_hash,
    };
    if options.skip_pdfs {
        tracing::info!("PDF downloads disabled for this run");
    }

    match harvest(config, options).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest finished: {} papers, report at {}",
                summary.total_papers,
                summary.report_path.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("conference_harvester=info,warn"),
            1 => EnvFilter::new("conference_harvester=debug,info"),
            2 => EnvFilter::new("conference_harvester=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, cli: &Cli) {
    println!("=== Conference Harvester Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    if !config.site.index_path.is_empty() {
        println!("  Index path: {}", config.site.index_path);
    }
    if let Some(template) = &config.site.pdf_fallback_path {
        println!("  PDF fallback: {}", template);
    }
    if let Some(template) = &config.site.doi_template {
        println!("  DOI template: {}", template);
    }

    println!("\nFetching:");
    println!(
        "  Delay between requests: {:.1}-{:.1}s",
        config.fetch.delay_min_secs, config.fetch.delay_max_secs
    );
    println!("  Attempts per request: {}", config.fetch.max_retries);
    println!("  Timeout: {}s", config.fetch.request_timeout_secs);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir.display());
    println!("  File prefix: {}", config.output.resolved_prefix());
    println!("  Page captures: {}", config.output.capture_pages);

    if config.sessions.is_empty() {
        println!("\nSessions: discovered from the index page");
    } else {
        println!("\nSessions ({}):", config.sessions.len());
        for entry in &config.sessions {
            println!(
                "  - {} {} ({})",
                entry.code,
                entry.title.as_deref().unwrap_or(""),
                entry.url
            );
        }
    }

    if let Some(limit) = cli.limit_sessions {
        println!("\nLimited to the first {} sessions", limit);
    }
    if cli.skip_pdfs {
        println!("PDF downloads disabled");
    }

    println!("\n✓ Configuration is valid");
}
