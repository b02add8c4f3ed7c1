use std::io;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::app::{serve, AppState};
use crate::config::EnvConfig;
use crate::db::postgres_service::PostgresService;
use crate::google::DriveHandle;
use crate::ops::{collectstatic::collect_static, wait};

/// Replaces the current process with `command`. Only returns on failure.
#[cfg(unix)]
pub fn exec_command(command: &[String]) -> io::Error {
    use std::os::unix::process::CommandExt;

    let Some((program, args)) = command.split_first() else {
        return io::Error::new(io::ErrorKind::InvalidInput, "empty command");
    };
    Command::new(program).args(args).exec()
}

/// Runs `command` to completion and exits with its status.
#[cfg(not(unix))]
pub fn exec_command(command: &[String]) -> io::Error {
    let Some((program, args)) = command.split_first() else {
        return io::Error::new(io::ErrorKind::InvalidInput, "empty command");
    };
    match Command::new(program).args(args).status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(e) => e,
    }
}

/// Container start-up: wait for the database, migrate, collect static files,
/// then hand over to `command` or serve HTTP in this process.
pub async fn run_entrypoint(config: Arc<EnvConfig>, command: Vec<String>, wait_timeout: Option<Duration>) -> anyhow::Result<()> {
    wait::wait_for_tcp(&config.database.host, config.database.port, wait::DEFAULT_INTERVAL, wait_timeout).await?;

    let db = PostgresService::from_config(&config.database)
        .await
        .context("connecting to database")?;
    db.migrate().await.context("applying migrations")?;

    let paths = config.paths.clone();
    tokio::task::spawn_blocking(move || collect_static(&paths))
        .await
        .context("collectstatic task panicked")??;

    if !command.is_empty() {
        info!(command = ?command, "handing off");
        let err = exec_command(&command);
        return Err(err).with_context(|| format!("exec {}", command[0]));
    }

    let state = AppState {
        db: Arc::new(db),
        drive: DriveHandle::from_config(&config.google),
        config,
    };
    serve(state).await.context("http server")?;
    Ok(())
}
