//! S3 version rewind tool
//!
//! Restores one object, a prefix, or a whole bucket to an earlier version by
//! copying a chosen historical version over the current one.

// s3-rewind/src/main.rs
mod config;
mod errors;
mod prompt;
mod restore;
mod scheduler;
mod store;
mod target;
mod telemetry;
mod versions;

use anyhow::{Context, Result};
use clap::Parser;
use config::{AppConfig, CliOverrides};
use prompt::{AssumeYesPrompter, Prompter, StdinPrompter};
use restore::RunReport;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use store::s3::S3Store;
use tracing::{Level, warn};

#[derive(Parser)]
#[command(name = "s3-rewind")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Restore S3 objects to an earlier version", long_about = None)]
struct Cli {
    /// s3://bucket, s3://bucket/prefix/* or s3://bucket/exact/key
    s3_url: String,

    /// How many steps back from the current head version to restore (default 1)
    #[arg(long, conflicts_with = "as_of_timestamp")]
    versions: Option<usize>,

    /// ISO-8601 timestamp; restore to the latest version at or before this time
    #[arg(long)]
    as_of_timestamp: Option<String>,

    /// Ignore delete markers when selecting rollback candidates
    #[arg(long)]
    ignore_delete_markers: bool,

    /// Destination bucket for restored copies (defaults to the source bucket)
    #[arg(long)]
    target_bucket: Option<String>,

    /// Region used when creating a missing target bucket
    #[arg(long)]
    target_region: Option<String>,

    /// Maximum number of concurrent S3 operations
    #[arg(long, env = "S3_REWIND_MAX_WORKERS")]
    max_workers: Option<usize>,

    /// Path to a JSON config file
    #[arg(long, env = "S3_REWIND_CONFIG")]
    config: Option<PathBuf>,

    /// Custom S3 endpoint (e.g. LocalStack or another S3-compatible service)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// AWS region of the source bucket
    #[arg(long)]
    region: Option<String>,

    /// Answer yes to every confirmation and skip keys without enough history
    #[arg(short, long)]
    yes: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines and a JSON summary
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            s3_url: self.s3_url.clone(),
            versions: self.versions,
            as_of_timestamp: self.as_of_timestamp.clone(),
            ignore_delete_markers: self.ignore_delete_markers,
            target_bucket: self.target_bucket.clone(),
            target_region: self.target_region.clone(),
            max_workers: self.max_workers,
            endpoint_url: self.endpoint_url.clone(),
            region: self.region.clone(),
            assume_yes: self.yes,
        }
    }
}

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    telemetry::init_tracing(cli.json, level);

    match run_app(&cli).await {
        Ok(report) => {
            println!("Completed. {}.", report);
            if cli.json {
                match report.to_json() {
                    Ok(summary) => println!("{}", summary),
                    Err(e) => warn!(error = %e, "failed to serialise run summary"),
                }
            }
            if report.has_failures() {
                eprintln!("❌ One or more restores failed.");
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(cli: &Cli) -> Result<RunReport> {
    let app_config = AppConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load application configuration")?;

    let store = Arc::new(S3Store::connect(&app_config.s3).await);
    let prompter: Box<dyn Prompter> = if app_config.restore.assume_yes {
        Box::new(AssumeYesPrompter)
    } else {
        Box::new(StdinPrompter)
    };

    println!("🔄 Starting restore of {}...", cli.s3_url);
    restore::run_restore_flow(&app_config, store, &*prompter)
        .await
        .context("Restore process failed")
}
