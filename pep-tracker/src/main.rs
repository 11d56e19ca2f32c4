//! pep-tracker - PEP attendance tracker
//!
//! `serve` keeps the attendance cache fresh until Ctrl-C. `inspect` ingests a
//! local workbook once and prints JSON, which is handy for checking a new
//! sheet layout. `cleanup` runs one artifact sweep.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pep_common::config::to_toml_string;
use pep_common::time;
use pep_tracker::ingest::{ingest_workbook, IngestOptions};
use pep_tracker::services::report::{pending_summaries, student_report};
use pep_tracker::{Scheduler, StudentQuery, TrackerConfig};

/// Command-line arguments for pep-tracker
#[derive(Parser, Debug)]
#[command(name = "pep-tracker")]
#[command(about = "Attendance tracker for the Physical Education Programme")]
#[command(version, long_version = env!("PEP_LONG_VERSION"))]
struct Cli {
    /// Config file (overrides PEP_CONFIG and the default locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (overrides [logging] level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh on a schedule and sweep old artifacts until Ctrl-C
    Serve,

    /// Ingest a local workbook once and print JSON
    Inspect {
        /// Workbook to read
        #[arg(short, long)]
        file: PathBuf,

        /// Report for the student whose roll number contains this
        #[arg(long, conflicts_with = "name")]
        roll: Option<String>,

        /// Report for the best match on this name
        #[arg(long)]
        name: Option<String>,

        /// List students short of the weekly minimum
        #[arg(long, conflicts_with_all = ["roll", "name"])]
        pending: bool,
    },

    /// Run one cleanup sweep and print the report
    Cleanup,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TrackerConfig::load(cli.config.clone()).context("Failed to load configuration")?;

    let level = cli.log_level.as_deref().unwrap_or(config.logging.level.as_str());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting pep-tracker v{} [{}] built {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TARGET")
    );

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Inspect {
            file,
            roll,
            name,
            pending,
        } => inspect(&config, file, roll, name, pending),
        Command::Cleanup => {
            let cleaner = config.cleaner();
            let report = cleaner.run();
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Config => {
            print!("{}", to_toml_string(&config)?);
            Ok(())
        }
    }
}

async fn serve(config: TrackerConfig) -> Result<()> {
    info!("Timezone: {}", config.timezone);
    info!("Download directory: {}", config.cleanup.download_dir.display());

    let cache = Arc::new(config.build_cache().context("Failed to initialize attendance cache")?);
    let scheduler = Scheduler::start(Arc::clone(&cache), config.schedule());

    signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("Shutdown requested");
    scheduler.shutdown().await;

    let status = cache.status().await;
    info!(
        "Final state: {} students, last updated {:?}, error {:?}",
        status.student_count, status.last_updated, status.error
    );
    Ok(())
}

fn inspect(
    config: &TrackerConfig,
    file: PathBuf,
    roll: Option<String>,
    name: Option<String>,
    pending: bool,
) -> Result<()> {
    let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let clock = config.clock()?;
    let options = IngestOptions::new(&clock, time::now(), config.rules.clone());
    let snapshot = ingest_workbook(&bytes, &options)?;

    let query = match (roll, name) {
        (Some(roll), _) => Some(StudentQuery::Roll(roll)),
        (None, Some(name)) => Some(StudentQuery::Name(name)),
        (None, None) => None,
    };

    let output = if let Some(query) = query {
        let Some(student) = snapshot.student(&query) else {
            bail!("No student matches {:?}", query);
        };
        serde_json::to_value(student_report(student, options.today, &config.rules))?
    } else if pending {
        serde_json::to_value(pending_summaries(&snapshot.students, options.today, &config.rules))?
    } else {
        json!({
            "studentCount": snapshot.student_count(),
            "termNames": snapshot.term_names,
            "dateColumns": snapshot.date_headers.len(),
            "firstDate": snapshot.date_headers.first(),
            "lastDate": snapshot.date_headers.last(),
            "lastUpdated": snapshot.last_updated,
        })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
