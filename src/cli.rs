use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::{serve, AppState};
use crate::config::EnvConfig;
use crate::db::postgres_service::PostgresService;
use crate::google::DriveHandle;
use crate::ingest::poll::{run_poller, PollOptions};
use crate::ingest::BookingIngestor;
use crate::ops::backup::{self, BackupSettings};
use crate::ops::collectstatic::collect_static;
use crate::ops::entrypoint::run_entrypoint;
use crate::ops::wait;

#[derive(Debug, Parser)]
#[command(name = "flowtels", version, about = "Flowtels web service and task runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API.
    Serve,
    /// Apply pending database migrations.
    Migrate,
    /// Block until the database accepts TCP connections.
    WaitForDb {
        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Copy static assets into STATIC_ROOT.
    Collectstatic,
    /// Wait for the database, migrate, collect static files, then run `cmd` or serve.
    Entrypoint {
        #[arg(long)]
        wait_timeout: Option<u64>,
        #[arg(last = true)]
        cmd: Vec<String>,
    },
    /// Create an administrator account.
    Createsuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SUPERUSER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Write a gzip SQL dump to BACKUP_DIR and prune old dumps.
    Backup,
    /// Replace the database with a gzip SQL dump.
    Restore {
        file: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Poll watched Drive folders for new booking spreadsheets.
    PollBookings {
        /// Seconds between polls (defaults to BOOKING_POLL_INTERVAL).
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Report new files without importing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Ingest one watched folder now.
    IngestFolder { folder_id: String },
}

impl Cli {
    pub async fn run(self, config: Arc<EnvConfig>) -> anyhow::Result<()> {
        match self.command {
            Command::Serve => {
                let db = connect(&config).await?;
                let state = AppState {
                    db: Arc::new(db),
                    drive: DriveHandle::from_config(&config.google),
                    config,
                };
                serve(state).await.context("http server")?;
            }
            Command::Migrate => {
                let db = connect(&config).await?;
                db.migrate().await.context("applying migrations")?;
                info!("migrations applied");
            }
            Command::WaitForDb { timeout } => {
                let attempts = wait::wait_for_tcp(
                    &config.database.host,
                    config.database.port,
                    wait::DEFAULT_INTERVAL,
                    timeout.map(Duration::from_secs),
                )
                .await?;
                println!("Database is available after {attempts} attempt(s).");
            }
            Command::Collectstatic => {
                let paths = config.paths.clone();
                let report = tokio::task::spawn_blocking(move || collect_static(&paths))
                    .await
                    .context("collectstatic task panicked")??;
                println!(
                    "{} static files copied, {} shadowed, {} compressed.",
                    report.copied, report.skipped, report.compressed
                );
            }
            Command::Entrypoint { wait_timeout, cmd } => {
                run_entrypoint(config, cmd, wait_timeout.map(Duration::from_secs)).await?;
            }
            Command::Createsuperuser { username, email, password } => {
                if password.is_empty() {
                    bail!("password must not be empty");
                }
                let db = connect(&config).await?;
                let id = db.create_superuser(&username, &email, &password).await?;
                println!("Superuser {username} created ({id}).");
            }
            Command::Backup => {
                let settings = BackupSettings::from_config(&config);
                let path = tokio::task::spawn_blocking(move || backup::run_backup(&settings))
                    .await
                    .context("backup task panicked")??;
                println!("Backup written to {}", path.display());
            }
            Command::Restore { file, yes } => {
                let settings = BackupSettings::from_config(&config);
                // The restore writes its own prompt and completion lines.
                tokio::task::spawn_blocking(move || {
                    backup::restore(&settings, &file, yes, io::stdin().lock(), io::stdout())
                })
                .await
                .context("restore task panicked")??;
            }
            Command::PollBookings { interval, max_iterations, dry_run } => {
                let ingestor = ingestor(&config).await?;
                let opts = PollOptions {
                    interval: Duration::from_secs(interval.unwrap_or(config.google.poll_interval_secs)),
                    max_iterations,
                    dry_run,
                };
                let iterations = run_poller(&ingestor, &opts).await;
                info!(iterations, "poller finished");
            }
            Command::IngestFolder { folder_id } => {
                let ingestor = ingestor(&config).await?;
                let folder = ingestor
                    .db()
                    .get_folder_by_drive_id(&folder_id)
                    .await
                    .with_context(|| format!("folder {folder_id} is not registered"))?;
                let report = ingestor.process_folder(&folder).await;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(())
    }
}

async fn connect(config: &EnvConfig) -> anyhow::Result<PostgresService> {
    PostgresService::from_config(&config.database)
        .await
        .context("connecting to database")
}

async fn ingestor(config: &EnvConfig) -> anyhow::Result<BookingIngestor> {
    let source = DriveHandle::from_config(&config.google).get()?;
    let db = connect(config).await?;
    Ok(BookingIngestor::new(db, source))
}
