use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::service::{parse_drive_time, BookingIngestor, NewFile};
use super::IngestError;
use crate::google::DriveFile;

/// Files ingested this recently are skipped by the poller.
pub fn recent_run_window() -> chrono::Duration {
    chrono::Duration::hours(1)
}

/// Only files modified within this window are picked up.
pub fn modified_window() -> chrono::Duration {
    chrono::Duration::days(1)
}

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_iterations: Option<u32>,
    pub dry_run: bool,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct PollReport {
    pub folders_checked: usize,
    pub new_files_found: usize,
    pub files_imported: usize,
    pub errors: Vec<String>,
}

pub fn is_spreadsheet(file: &DriveFile) -> bool {
    let name = file.name.to_lowercase();
    file.mime_type.contains("spreadsheet")
        || file.mime_type.contains("excel")
        || name.ends_with(".xlsx")
        || name.ends_with(".xls")
}

/// Spreadsheets modified in the last day that have no successful run in the
/// last hour. A missing or unreadable modified time counts as recent.
pub fn filter_new_files(files: &[DriveFile], recently_ingested: &HashSet<String>, now: DateTime<Utc>) -> Vec<DriveFile> {
    files
        .iter()
        .filter(|f| is_spreadsheet(f))
        .filter(|f| !recently_ingested.contains(&f.id))
        .filter(|f| match parse_drive_time(f.modified_time.as_deref()) {
            Some(modified) => modified >= now - modified_window(),
            None => true,
        })
        .cloned()
        .collect()
}

impl BookingIngestor {
    /// One pass over every watched folder.
    pub async fn poll_folders(&self, dry_run: bool) -> Result<PollReport, IngestError> {
        let mut report = PollReport::default();
        let folders = self.db().list_watched_folders().await?;

        if folders.is_empty() {
            warn!("no active watched folders found");
            return Ok(report);
        }
        report.folders_checked = folders.len();

        for folder in &folders {
            info!(folder = %folder.folder_name, "checking folder");
            let candidates = match self.candidates(&folder.folder_id).await {
                Ok(files) => files,
                Err(e) => {
                    let msg = format!("Error checking folder {}: {e}", folder.folder_name);
                    error!("{msg}");
                    report.errors.push(msg);
                    continue;
                }
            };
            if candidates.is_empty() {
                continue;
            }
            report.new_files_found += candidates.len();
            info!(folder = %folder.folder_name, count = candidates.len(), "found new files");

            if dry_run {
                for file in &candidates {
                    info!(file = %file.name, "dry run: would process");
                }
                continue;
            }

            for file in &candidates {
                match self.ingest_file(folder, &NewFile::from_drive(file)).await {
                    Ok(_) => {
                        report.files_imported += 1;
                        info!(file = %file.name, "imported");
                    }
                    Err(e) => {
                        let msg = format!("Error processing file {}: {e}", file.name);
                        error!("{msg}");
                        report.errors.push(msg);
                    }
                }
            }
        }
        Ok(report)
    }

    async fn candidates(&self, folder_id: &str) -> Result<Vec<DriveFile>, IngestError> {
        let files = self.source().list_files(folder_id).await?;
        let now = Utc::now();
        let ids: Vec<String> = files.iter().map(|f| f.id.clone()).collect();
        let recent = self.db().recently_ingested(&ids, now - recent_run_window()).await?;
        Ok(filter_new_files(&files, &recent, now))
    }
}

fn log_report(iteration: u32, report: &PollReport) {
    info!(
        iteration,
        folders_checked = report.folders_checked,
        new_files_found = report.new_files_found,
        files_imported = report.files_imported,
        errors = report.errors.len(),
        "polling results"
    );
    for err in &report.errors {
        warn!(iteration, "{err}");
    }
}

/// Polls until Ctrl-C or `max_iterations`. An iteration that fails is logged
/// and the loop carries on.
pub async fn run_poller(ingestor: &BookingIngestor, opts: &PollOptions) -> u32 {
    info!(interval_secs = opts.interval.as_secs(), dry_run = opts.dry_run, "starting booking file polling");
    let mut iteration = 0u32;

    loop {
        iteration += 1;
        info!(iteration, "polling iteration");
        match ingestor.poll_folders(opts.dry_run).await {
            Ok(report) => log_report(iteration, &report),
            Err(e) => error!(iteration, error = %e, "error during polling iteration"),
        }

        if opts.max_iterations.is_some_and(|max| iteration >= max) {
            info!(iteration, "reached max iterations, stopping");
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(opts.interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("polling stopped by user");
                break;
            }
        }
    }
    iteration
}
