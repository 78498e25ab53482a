//! News relay service
//!
//! Features:
//! - JSON feed ingestion with URL-fingerprint deduplication
//! - Two-phase translation and SEO enrichment with raw-response checkpoints
//! - Telegram channel notifications, at most one per item
//! - Read API and sitemap for the published items
//! - Periodic ingest → enrich → notify cycle
//! - Graceful shutdown with SIGTERM handling
//! - Correlation IDs on every unit of work

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Instrument};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use news_relay::config::Config;
use news_relay::pipeline::{EnrichOutcome, NotifyOutcome, Pipeline, Scheduler};
use news_relay::schemas::Stage;
use news_relay::server::{self, AppState};
use news_relay::storage::ItemStore;

/// News relay - feed ingestion, translation and channel publishing
#[derive(Parser, Debug)]
#[command(name = "news-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ingests a news feed, translates items and republishes them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, default_value = "false", global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server and the periodic cycle
    Serve {
        /// Serve HTTP only, without the periodic cycle
        #[arg(long, default_value = "false")]
        no_scheduler: bool,
    },

    /// Run one ingest → enrich → notify cycle
    Tick,

    /// Pull the feed once
    Ingest,

    /// Enrich one crawled item
    Enrich {
        /// Item to (re)process instead of the next eligible one
        #[arg(long)]
        id: Option<i64>,
    },

    /// Post one item to the channel
    Notify,

    /// Create the database schema
    Migrate,

    /// Show item counts per stage
    Status,
}

/// Sets up structured logging with tracing
fn setup_logging(log_level: &str, json_output: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

/// Broadcasts shutdown on SIGTERM/SIGINT
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    let _ = shutdown_tx.send(());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs);

    // Session correlation id; cycles and HTTP requests get their own
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let session = tracing::info_span!("session", correlation_id = %correlation_id);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        correlation_id = %correlation_id,
        "Starting news relay"
    );

    let config = Config::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    info!(
        database = %config.database_url,
        feed = %config.feed_url,
        provider = config.has_provider(),
        messaging = config.has_messaging(),
        tick_interval = %config.tick_interval,
        "Configuration loaded"
    );

    run_command(cli.command, config).instrument(session).await
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Serve { no_scheduler } => serve(config, no_scheduler).await?,
        Commands::Tick => tick(&config).await?,
        Commands::Ingest => {
            let pipeline = Pipeline::from_config(&config).await?;
            let report = pipeline.ingestor().ingest().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Enrich { id } => {
            let pipeline = Pipeline::from_config(&config).await?;
            match pipeline.enricher()?.enrich_one(id).await? {
                EnrichOutcome::Enriched(item) => println!(
                    "Enriched item {} ({})",
                    item.id,
                    item.slug_url.as_deref().unwrap_or_default()
                ),
                EnrichOutcome::NoWork => println!("No untranslated records found."),
            }
        }
        Commands::Notify => {
            let pipeline = Pipeline::from_config(&config).await?;
            match pipeline.notifier()?.notify_one().await? {
                NotifyOutcome::Sent { id, .. } => println!("Sent item {}", id),
                NotifyOutcome::NoWork => println!("No records to send."),
            }
        }
        Commands::Migrate => {
            ItemStore::connect(&config.database_url, config.database_max_connections).await?;
            println!("Schema is up to date.");
        }
        Commands::Status => show_status(&config).await?,
    }

    Ok(())
}

/// Runs the HTTP server and, unless disabled, the periodic cycle
async fn serve(config: Config, no_scheduler: bool) -> Result<()> {
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen_addr {:?}", config.listen_addr))?;

    let pipeline = Arc::new(Pipeline::from_config(&config).await?);
    let state = Arc::new(AppState::from_config(pipeline.clone(), &config)?);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let scheduler_handle = if no_scheduler {
        info!("Periodic cycle disabled");
        None
    } else {
        let scheduler = Scheduler::new(pipeline.clone(), config.tick_period()?);
        let shutdown_rx = shutdown_tx.subscribe();
        Some(tokio::spawn(async move { scheduler.run(shutdown_rx).await }))
    };

    let server_rx = shutdown_tx.subscribe();
    tokio::spawn(shutdown_signal(shutdown_tx));

    if let Err(e) = server::serve(addr, state, server_rx).await {
        error!(error = %e, "HTTP server failed");
        return Err(e.into());
    }

    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Scheduler task failed");
        }
    }

    info!("News relay stopped");
    Ok(())
}

/// Runs one cycle and prints each stage's outcome
async fn tick(config: &Config) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let report = pipeline.run_cycle().await;

    println!("\nCycle {}", report.correlation_id);
    match &report.ingest {
        Ok(ingest) => println!(
            "  ingest: {} inserted, {} duplicates, {} failed, {} skipped",
            ingest.inserted, ingest.duplicates, ingest.failed, ingest.skipped
        ),
        Err(e) => println!("  ingest: failed ({})", e),
    }
    match &report.enrich {
        Ok(EnrichOutcome::Enriched(item)) => println!("  enrich: item {}", item.id),
        Ok(EnrichOutcome::NoWork) => println!("  enrich: no work"),
        Err(e) => println!("  enrich: failed ({})", e),
    }
    match &report.notify {
        Ok(NotifyOutcome::Sent { id, .. }) => println!("  notify: item {}", id),
        Ok(NotifyOutcome::NoWork) => println!("  notify: no work"),
        Err(e) => println!("  notify: failed ({})", e),
    }

    Ok(())
}

/// Shows configured collaborators and item counts per stage
async fn show_status(config: &Config) -> Result<()> {
    println!("\nNews Relay Status");
    println!("=================\n");

    println!("Collaborators:");
    println!("  - Feed:      {}", config.feed_url);
    println!(
        "  - Provider:  {}",
        if config.has_provider() { config.openai_model.as_str() } else { "not configured (no API key)" }
    );
    println!(
        "  - Messaging: {}",
        if config.has_messaging() { "telegram" } else { "not configured (no bot token or chat id)" }
    );

    let store = ItemStore::connect(&config.database_url, 1).await?;
    let counts = store.stage_counts().await?;

    println!("\nItems ({} total):", counts.total());
    for (stage, count) in [
        (Stage::Discovered, counts.discovered),
        (Stage::Crawled, counts.crawled),
        (Stage::Translated, counts.translated),
        (Stage::Notified, counts.notified),
    ] {
        println!("  {:<11} {}", format!("{}:", stage.as_str()), count);
    }

    Ok(())
}
