//! layoffwatch command-line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use layoffwatch::config::{load_settings, Settings};
use layoffwatch::discovery::{NewsSearchClient, DEFAULT_LOOKBACK_DAYS};
use layoffwatch::repository::{seed, Database};
use layoffwatch::server;
use layoffwatch::services::{run_daily, ReviewService};

/// layoffwatch - curated tracker of AI-attributed layoffs
#[derive(Parser, Debug)]
#[command(name = "layoffwatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Also run the daily scan and cleanup in-process
        #[arg(long)]
        schedule: bool,
    },

    /// Fetch recent articles into the review queue
    Scan {
        /// Days to look back
        #[arg(short, long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
        days: u32,
    },

    /// Delete rejected candidates past the retention window
    Cleanup {
        /// Retention window in days
        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Run the scheduled job once: a short scan, then cleanup
    Daily,

    /// Import reports from a JSON array
    Seed {
        /// JSON file of report records
        file: PathBuf,
    },

    /// Show record and candidate counts
    Stats,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Open the database and create the schema.
async fn open_database(settings: &Settings) -> Result<Database> {
    let db = Database::open(&settings.database_url).with_seed_path(settings.seed_path.clone());
    db.ensure_initialized()
        .await
        .with_context(|| format!("failed to open database {}", settings.database_url))?;
    Ok(db)
}

async fn review_service(settings: &Settings) -> Result<ReviewService> {
    let db = open_database(settings).await?;
    let client = NewsSearchClient::new(settings.discovery.clone())
        .context("failed to build discovery client")?;
    Ok(ReviewService::new(db, Arc::new(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = load_settings().await;
    if let Some(database) = cli.database {
        settings.database_url = database;
    }
    tracing::debug!("{:?}", settings);

    match cli.command {
        Commands::Serve {
            host,
            port,
            schedule,
        } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            server::serve(&settings, &host, port, schedule).await?;
        }

        Commands::Scan { days } => {
            let review = review_service(&settings).await?;
            let report = review.scan(days).await?;
            println!(
                "Added {}, skipped {}, errors {}",
                report.added, report.skipped, report.errors
            );
        }

        Commands::Cleanup { days } => {
            let review = review_service(&settings).await?;
            let days = days.unwrap_or(settings.retention_days);
            let removed = review.cleanup(days).await?;
            println!("Removed {} rejected candidates older than {} days", removed, days);
        }

        Commands::Daily => {
            let review = review_service(&settings).await?;
            let report = run_daily(
                &review,
                settings.scheduled_lookback_days,
                settings.retention_days,
            )
            .await?;
            match (&report.scan, &report.scan_error) {
                (Some(scan), _) => println!(
                    "Scan: added {}, skipped {}, errors {}",
                    scan.added, scan.skipped, scan.errors
                ),
                (None, Some(e)) => println!("Scan skipped: {}", e),
                (None, None) => {}
            }
            println!("Cleanup: removed {}", report.removed);
        }

        Commands::Seed { file } => {
            let db = open_database(&settings).await?;
            let inputs = seed::load_seed_file(&file).await?;
            let summary = seed::import_reports(&db.reports(), inputs).await?;
            println!(
                "Imported {} reports ({} skipped)",
                summary.imported, summary.skipped
            );
        }

        Commands::Stats => {
            let db = open_database(&settings).await?;
            let reports = db.reports().counts().await?;
            let candidates = db.candidates().counts().await?;
            println!(
                "Reports:    {} total ({} published, {} draft)",
                reports.total, reports.published, reports.draft
            );
            println!(
                "Candidates: {} total ({} pending, {} approved, {} rejected)",
                candidates.total, candidates.pending, candidates.approved, candidates.rejected
            );
        }
    }

    Ok(())
}
