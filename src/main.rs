//! Sumi-Sweep main entry point
//!
//! This is the command-line interface for the Sumi-Sweep site sweeper.

use anyhow::Context;
use clap::Parser;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_sweep::config::{load_config_with_hash, validate, Config};
use sumi_sweep::crawler::{Crawler, FetchStrategy};
use sumi_sweep::output::{
    export_results, print_statistics, CrawlObserver, ExportFormat, ProgressEvent,
};
use sumi_sweep::url::canonicalize;
use tracing_subscriber::EnvFilter;

/// Sumi-Sweep: a single-domain site sweeper
///
/// Sumi-Sweep starts from a seed URL and visits every page of the same domain
/// reachable through links, up to a page budget. While it runs, type `pause`,
/// `resume`, `stop` or `status` followed by Enter; Ctrl-C stops gracefully.
#[derive(Parser, Debug)]
#[command(name = "sumi-sweep")]
#[command(version)]
#[command(about = "A single-domain site sweeper", long_about = None)]
struct Cli {
    /// Seed URL; only pages on its domain are crawled
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Minimum delay between page fetches, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Fetch script-rendered pages through the configured render endpoint
    #[arg(long)]
    render: bool,

    /// Where to write the results
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Result format (csv, json, txt); inferred from the output extension by default
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<ExportFormat>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seed, then exit without crawling
    #[arg(long)]
    dry_run: bool,
}

/// Prints one line per processed page
struct ConsoleObserver;

impl CrawlObserver for ConsoleObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        println!(
            "[{:5.1}%] visited {} | queued {} | failed {} | elapsed {} | eta {} | {:.2}s/page",
            event.progress_percent,
            event.visited,
            event.queued,
            event.failed,
            event.elapsed_formatted,
            event.eta_formatted,
            event.average_sec_per_page
        );
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
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.path));
    let format = resolve_format(cli.format, &config, &output_path);

    if cli.dry_run {
        return handle_dry_run(&config, &cli.seed, format, &output_path);
    }

    handle_crawl(config, &cli, format, &output_path).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sweep=info,warn"),
            1 => EnvFilter::new("sumi_sweep=debug,info"),
            2 => EnvFilter::new("sumi_sweep=trace,debug"),
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

/// Command-line flags win over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawl.delay_ms = delay_ms;
    }
    if cli.render {
        config.crawl.use_rendering_transport = true;
    }
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
}

fn resolve_format(flag: Option<ExportFormat>, config: &Config, path: &Path) -> ExportFormat {
    flag.or(config.output.format)
        .or_else(|| ExportFormat::from_path(path))
        .unwrap_or(ExportFormat::Csv)
}

/// Handles the --dry-run mode: validates config and seed, shows what would be crawled
fn handle_dry_run(
    config: &Config,
    seed: &str,
    format: ExportFormat,
    output_path: &Path,
) -> anyhow::Result<()> {
    let seed_url =
        canonicalize(seed, None).with_context(|| format!("invalid seed URL {}", seed))?;

    println!("=== Sumi-Sweep Dry Run ===\n");

    println!("Seed:");
    println!("  URL: {}", seed_url);
    println!("  Domain: {}", seed_url.host());

    println!("\nCrawl:");
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Delay: {}ms", config.crawl.delay_ms);
    println!(
        "  Render transport: {}",
        if config.crawl.use_rendering_transport {
            "enabled"
        } else {
            "disabled"
        }
    );

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Render timeout: {}ms", config.fetch.render_timeout_ms);
    if let Some(endpoint) = &config.fetch.render_endpoint {
        println!("  Render endpoint: {}", endpoint);
    }
    println!("  Routes ({}):", config.fetch.routes.len());
    for route in &config.fetch.routes {
        println!("    - {}", route);
    }

    println!("\nOutput:");
    println!("  Path: {}", output_path.display());
    println!("  Format: {}", format.extension());

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    cli: &Cli,
    format: ExportFormat,
    output_path: &Path,
) -> anyhow::Result<()> {
    let strategy = FetchStrategy::from_config(&config).context("failed to build transports")?;
    if strategy.has_renderer() {
        tracing::info!("Render transport enabled");
    }

    let crawler = if cli.quiet {
        Crawler::new(config.crawl.clone(), strategy)
    } else {
        Crawler::with_observer(config.crawl.clone(), strategy, Arc::new(ConsoleObserver))
    };

    spawn_controls(&crawler);

    let results = match crawler.start(&cli.seed).await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        println!();
        print_statistics(&results);
        println!();
    }

    export_results(&results, format, output_path)
        .with_context(|| format!("failed to export to {}", output_path.display()))?;

    if !cli.quiet {
        println!("✓ Results written to: {}", output_path.display());
    }

    Ok(())
}

/// Wires Ctrl-C and stdin commands to the engine
fn spawn_controls(crawler: &Crawler) {
    let interrupted = crawler.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            interrupted.stop();
        }
    });

    // Blocking reads live on their own thread so they never hold up shutdown
    let commands = crawler.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            run_command(&commands, line.trim());
        }
    });
}

fn run_command(crawler: &Crawler, command: &str) {
    match command.to_ascii_lowercase().as_str() {
        "" => {}
        "pause" | "p" => {
            if !crawler.pause() {
                println!("Cannot pause: crawl is {}", crawler.state());
            }
        }
        "resume" | "r" => {
            if !crawler.resume() {
                println!("Cannot resume: crawl is {}", crawler.state());
            }
        }
        "stop" | "s" => {
            if !crawler.stop() {
                println!("Cannot stop: crawl is {}", crawler.state());
            }
        }
        "status" => {
            let progress = crawler.progress();
            println!(
                "{} | visited {} | queued {} | failed {} | elapsed {}",
                crawler.state(),
                progress.visited,
                progress.queued,
                progress.failed,
                progress.elapsed_formatted
            );
        }
        other => println!("Unknown command '{}' (pause, resume, stop, status)", other),
    }
}
