//! Forager main entry point
//!
//! One binary runs every pipeline role; the subcommand picks which one.

use clap::{Parser, Subcommand};
use forager::config::{load_config, Config};
use forager::db::PgMetadataStore;
use forager::drain::MetadataDrain;
use forager::loader::import_urls;
use forager::queue::{FrontierStore, RedisQueue};
use forager::sink::ResultSink;
use forager::sites::SiteRules;
use forager::worker::{BrowserWorker, LightWorker};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Forager: a distributed vendor-page crawl pipeline
///
/// Every role shares one configuration file and coordinates through durable
/// queues, so each subcommand can run as its own process on its own host.
#[derive(Parser, Debug)]
#[command(name = "forager")]
#[command(version = "0.1.0")]
#[command(about = "A distributed vendor-page crawl pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "forager.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import candidate URLs from a file into the frontier
    Load {
        /// Line-delimited URL file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
    /// Run the lightweight HTTP fetch worker
    Fetch,
    /// Run the browser-driven fetch worker
    Browse,
    /// Run the result sink
    Sink,
    /// Run the metadata drain
    Drain,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let queue = Arc::new(RedisQueue::connect(&config.queue.url).await?);

    match cli.command {
        Command::Load { input } => handle_load(&input, queue, &config).await?,
        Command::Fetch => handle_fetch(queue, &config).await?,
        Command::Browse => handle_browse(queue, &config).await?,
        Command::Sink => handle_sink(queue, &config).await?,
        Command::Drain => handle_drain(queue, &config).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forager=info,warn"),
            1 => EnvFilter::new("forager=debug,info"),
            2 => EnvFilter::new("forager=trace,debug"),
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

async fn handle_load(
    input: &PathBuf,
    queue: Arc<RedisQueue>,
    config: &Config,
) -> anyhow::Result<()> {
    let frontier = FrontierStore::new(queue, &config.queue.frontier_key);
    let report = import_urls(input, &frontier).await?;
    println!(
        "Imported {} URLs ({} new, {} already queued, {} invalid)",
        report.read, report.inserted, report.skipped, report.invalid
    );
    Ok(())
}

async fn handle_fetch(
    queue: Arc<RedisQueue>,
    config: &Config,
) -> anyhow::Result<()> {
    let rules = SiteRules::load(&config.sites.rules_path)?;
    let worker = LightWorker::new(queue, rules, config)?;
    let processed = worker.run().await?;
    println!("Fetched {processed} URLs");
    Ok(())
}

async fn handle_browse(
    queue: Arc<RedisQueue>,
    config: &Config,
) -> anyhow::Result<()> {
    let worker = BrowserWorker::new(queue, config);
    let processed = worker.run().await?;
    println!("Fetched {processed} URLs via browser");
    Ok(())
}

async fn handle_sink(
    queue: Arc<RedisQueue>,
    config: &Config,
) -> anyhow::Result<()> {
    let sink = ResultSink::new(
        queue,
        &config.queue.results_key,
        &config.queue.metadata_key,
        &config.storage.root,
        Duration::from_secs(config.drain.check_interval_secs),
    );
    sink.run().await?;
    Ok(())
}

async fn handle_drain(
    queue: Arc<RedisQueue>,
    config: &Config,
) -> anyhow::Result<()> {
    let store = PgMetadataStore::connect(&config.database.url, config.database.max_connections)
        .await?;
    let drain = MetadataDrain::new(
        queue,
        &config.queue.metadata_key,
        Arc::new(store),
        &config.storage.backup_dir,
        config.drain.batch_size,
        Duration::from_secs(config.drain.check_interval_secs),
    );
    match drain.run().await {}
}
