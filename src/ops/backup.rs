use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use chrono::{Duration, Local, NaiveDateTime};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EnvConfig;

const PREFIX: &str = "backup_";
const SUFFIX: &str = ".sql.gz";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const RETENTION_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An external program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl DbCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn spawn(&self, stdin: Stdio, stdout: Stdio) -> Result<std::process::Child, BackupError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .spawn()
            .map_err(|source| BackupError::Spawn { program: self.program.clone(), source })
    }

    fn check(&self, status: ExitStatus) -> Result<(), BackupError> {
        if status.success() {
            Ok(())
        } else {
            Err(BackupError::CommandFailed { program: self.program.clone(), status })
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub backup_dir: PathBuf,
    /// Writes a plain SQL dump to stdout.
    pub dump: DbCommand,
    /// Reads a plain SQL dump from stdin.
    pub restore: DbCommand,
    pub retention: Duration,
}

impl BackupSettings {
    pub fn from_config(config: &EnvConfig) -> Self {
        let url = config.database.url.as_str();
        Self {
            backup_dir: config.paths.backup_dir.clone(),
            dump: DbCommand::new("pg_dump", &["--dbname", url, "--no-owner", "--no-privileges"]),
            restore: DbCommand::new("psql", &["--dbname", url, "--quiet", "-v", "ON_ERROR_STOP=1"]),
            retention: Duration::days(RETENTION_DAYS),
        }
    }
}

pub fn backup_filename(at: NaiveDateTime) -> String {
    format!("{PREFIX}{}{SUFFIX}", at.format(STAMP_FORMAT))
}

/// Timestamp of a file named like [`backup_filename`] output, `None` for anything else.
pub fn parse_backup_stamp(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

pub fn run_backup(settings: &BackupSettings) -> Result<PathBuf, BackupError> {
    run_backup_at(settings, Local::now().naive_local())
}

/// Dumps the database to `backup_<stamp>.sql.gz`, then prunes old backups.
/// The dump is written to a `.partial` file first and only renamed once the
/// dump program has exited cleanly.
pub fn run_backup_at(settings: &BackupSettings, now: NaiveDateTime) -> Result<PathBuf, BackupError> {
    fs::create_dir_all(&settings.backup_dir)?;
    let target = settings.backup_dir.join(backup_filename(now));
    let partial = target.with_extension("gz.partial");

    info!(file = %target.display(), "starting database backup");
    let result = dump_into(&settings.dump, &partial);
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, &target)?;

    let size = fs::metadata(&target).map(|m| m.len()).unwrap_or(0);
    info!(file = %target.display(), bytes = size, "backup completed");

    let removed = prune_backups(&settings.backup_dir, now, settings.retention)?;
    if !removed.is_empty() {
        info!(count = removed.len(), "removed expired backups");
    }
    Ok(target)
}

fn dump_into(dump: &DbCommand, partial: &Path) -> Result<(), BackupError> {
    let mut child = dump.spawn(Stdio::null(), Stdio::piped())?;
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(partial)?), Compression::default());

    if let Some(mut stdout) = child.stdout.take() {
        io::copy(&mut stdout, &mut encoder)?;
    }
    let status = child.wait()?;
    dump.check(status)?;

    encoder.finish()?.flush()?;
    Ok(())
}

/// Deletes backups whose filename stamp is older than `retention` before `now`.
pub fn prune_backups(dir: &Path, now: NaiveDateTime, retention: Duration) -> Result<Vec<PathBuf>, BackupError> {
    let cutoff = now - retention;
    let mut removed = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(stamp) = name.to_str().and_then(parse_backup_stamp) else {
            continue;
        };
        if stamp < cutoff && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed.push(entry.path());
        }
    }
    removed.sort();
    Ok(removed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Cancelled,
}

/// Replays a gzip SQL dump into the database after an explicit `yes`.
/// Nothing is started when the file is missing or the prompt is declined.
pub fn restore<R: BufRead, W: Write>(
    settings: &BackupSettings,
    file: &Path,
    assume_yes: bool,
    mut input: R,
    mut output: W,
) -> Result<RestoreOutcome, BackupError> {
    if !file.is_file() {
        return Err(BackupError::NotFound(file.to_path_buf()));
    }

    if !assume_yes {
        writeln!(output, "WARNING: This will replace the current database with {}", file.display())?;
        write!(output, "Type 'yes' to continue: ")?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if answer.trim() != "yes" {
            writeln!(output, "Restore cancelled.")?;
            info!(file = %file.display(), "restore cancelled");
            return Ok(RestoreOutcome::Cancelled);
        }
    }

    info!(file = %file.display(), "restoring database");
    let mut decoder = GzDecoder::new(File::open(file)?);
    let mut child = settings.restore.spawn(Stdio::piped(), Stdio::inherit())?;
    let copied = match child.stdin.take() {
        Some(mut stdin) => io::copy(&mut decoder, &mut stdin).map(|_| ()),
        None => Ok(()),
    };
    let status = child.wait()?;
    settings.restore.check(status)?;
    if let Err(e) = copied {
        warn!(error = %e, "restore input was not fully written");
        return Err(e.into());
    }

    writeln!(output, "Restore completed.")?;
    info!(file = %file.display(), "restore completed");
    Ok(RestoreOutcome::Restored)
}
