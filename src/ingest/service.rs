use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use entity::{booking, booking_conflict, google_drive_folder, processed_file, quarantined_row, raw_row};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::merge::{plan_merge, row_hash, MergeOutcome, MergePlan};
use super::sheet::{extract_bookings, extract_file_date, BookingRow, ExtractedRow};
use super::{IngestError, RunStats};
use crate::db::postgres_service::PostgresService;
use crate::google::{DriveFile, DriveSource};
use crate::types::folder::IngestionRunRes;
use crate::utils::token;

/// A spreadsheet that has not been ingested for its folder yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFile {
    pub file_id: String,
    pub filename: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    /// When the data was exported; orders files and decides merge precedence.
    pub data_time: DateTime<Utc>,
}

impl NewFile {
    pub fn from_drive(file: &DriveFile) -> Self {
        let created_time = parse_drive_time(file.created_time.as_deref())
            .or_else(|| parse_drive_time(file.modified_time.as_deref()))
            .unwrap_or_else(Utc::now);
        let modified_time = parse_drive_time(file.modified_time.as_deref()).unwrap_or(created_time);
        NewFile {
            file_id: file.id.clone(),
            filename: file.name.clone(),
            created_time,
            modified_time,
            data_time: data_time_for(&file.name, created_time),
        }
    }
}

pub fn parse_drive_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?).ok().map(|t| t.with_timezone(&Utc))
}

/// Date from the filename at the file's creation time of day, else the creation time.
pub fn data_time_for(filename: &str, created: DateTime<Utc>) -> DateTime<Utc> {
    match extract_file_date(filename) {
        Some(date) => date.and_time(created.time()).and_utc(),
        None => created,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileFailure {
    pub filename: Option<String>,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FolderReport {
    pub folder_id: String,
    pub folder_name: String,
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_bookings_inserted: i32,
    pub total_bookings_updated: i32,
    pub total_bookings_ignored: i32,
    pub total_conflicts: i32,
    pub total_quarantined: i32,
    pub ingestion_runs: Vec<IngestionRunRes>,
    pub errors: Vec<FileFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FolderReport {
    fn new(folder: &google_drive_folder::Model) -> Self {
        Self {
            folder_id: folder.folder_id.clone(),
            folder_name: folder.folder_name.clone(),
            files_discovered: 0,
            files_processed: 0,
            files_failed: 0,
            total_bookings_inserted: 0,
            total_bookings_updated: 0,
            total_bookings_ignored: 0,
            total_conflicts: 0,
            total_quarantined: 0,
            ingestion_runs: Vec::new(),
            errors: Vec::new(),
            message: None,
        }
    }
}

/// Where the current file's rows come from.
struct RunContext<'a> {
    folder_pk: Uuid,
    run_id: Uuid,
    file: &'a NewFile,
}

#[derive(Clone)]
pub struct BookingIngestor {
    db: PostgresService,
    source: Arc<dyn DriveSource>,
}

impl BookingIngestor {
    pub fn new(db: PostgresService, source: Arc<dyn DriveSource>) -> Self {
        Self { db, source }
    }

    pub fn db(&self) -> &PostgresService {
        &self.db
    }

    pub fn source(&self) -> &dyn DriveSource {
        self.source.as_ref()
    }

    /// Spreadsheets in the folder without a processed-file record, oldest data first.
    pub async fn discover_new_files(&self, folder: &google_drive_folder::Model) -> Result<Vec<NewFile>, IngestError> {
        let files = self.source.list_spreadsheets(&folder.folder_id).await?;
        let processed = self.db.processed_file_ids(folder.id).await?;

        let mut new_files: Vec<NewFile> = files
            .iter()
            .filter(|f| !processed.contains(&f.id))
            .map(NewFile::from_drive)
            .collect();
        new_files.sort_by_key(|f| f.data_time);
        Ok(new_files)
    }

    /// Imports one file. The run row is written outside the data transaction,
    /// so a failure rolls back every booking change and still records the
    /// failed run.
    pub async fn ingest_file(
        &self,
        folder: &google_drive_folder::Model,
        file: &NewFile,
    ) -> Result<entity::ingestion_run::Model, IngestError> {
        let run = self.db.create_run(folder.id, file).await?;
        info!(run_id = %run.id, file = %file.filename, "ingesting file");

        let ctx = RunContext { folder_pk: folder.id, run_id: run.id, file };
        match self.load_and_merge(&ctx).await {
            Ok(stats) => Ok(self.db.finish_run(run, &stats).await?),
            Err(e) => {
                warn!(run_id = %run.id, file = %file.filename, error = %e, "ingestion failed");
                self.db.fail_run(run, e.to_string()).await?;
                Err(e)
            }
        }
    }

    async fn load_and_merge(&self, ctx: &RunContext<'_>) -> Result<RunStats, IngestError> {
        let sheet = self.source.read_sheet(&ctx.file.file_id, None).await?;
        let extraction = extract_bookings(&sheet)?;

        let mut stats = RunStats {
            sheet_names: vec![extraction.sheet_name.clone()],
            rows_processed: (extraction.bookings.len() + extraction.errors.len()) as i32,
            ..Default::default()
        };

        let txn = self.db.connection().begin().await?;

        for row in &extraction.bookings {
            let savepoint = txn.begin().await?;
            match apply_row(&savepoint, ctx, row).await {
                Ok(outcome) => {
                    savepoint.commit().await?;
                    stats.record(outcome);
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    warn!(row = row.row_index, error = %e, "quarantining row");
                    quarantine(&txn, ctx, row.row_index as i32, &row.raw, e.to_string()).await?;
                    stats.rows_quarantined += 1;
                }
            }
        }

        for err in &extraction.errors {
            quarantine(&txn, ctx, err.row as i32, &err.data, err.error.clone()).await?;
            stats.rows_quarantined += 1;
        }

        processed_file::Entity::insert(processed_file::ActiveModel {
            id: Set(token::new_id()),
            folder_id: Set(ctx.folder_pk),
            file_id: Set(ctx.file.file_id.clone()),
            filename: Set(ctx.file.filename.clone()),
            ingestion_run_id: Set(ctx.run_id),
            processed_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([processed_file::Column::FolderId, processed_file::Column::FileId])
                .update_columns([
                    processed_file::Column::Filename,
                    processed_file::Column::IngestionRunId,
                    processed_file::Column::ProcessedAt,
                ])
                .to_owned(),
        )
        .exec(&txn)
        .await?;

        txn.commit().await?;
        Ok(stats)
    }

    /// Discovers and ingests every new file in the folder. Failures are
    /// collected in the report rather than returned.
    pub async fn process_folder(&self, folder: &google_drive_folder::Model) -> FolderReport {
        let mut report = FolderReport::new(folder);

        let new_files = match self.discover_new_files(folder).await {
            Ok(files) => files,
            Err(e) => {
                report.errors.push(FileFailure {
                    filename: None,
                    error: format!("Folder processing failed: {e}"),
                });
                return report;
            }
        };
        report.files_discovered = new_files.len();
        if new_files.is_empty() {
            report.message = Some("No new files found".to_string());
            return report;
        }

        for file in &new_files {
            match self.ingest_file(folder, file).await {
                Ok(run) => {
                    report.files_processed += 1;
                    report.total_bookings_inserted += run.rows_inserted;
                    report.total_bookings_updated += run.rows_updated;
                    report.total_bookings_ignored += run.rows_ignored;
                    report.total_conflicts += run.conflicts_detected;
                    report.total_quarantined += run.rows_quarantined;
                    report.ingestion_runs.push(run.into());
                }
                Err(e) => {
                    report.files_failed += 1;
                    report.errors.push(FileFailure {
                        filename: Some(file.filename.clone()),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            folder = %folder.folder_id,
            processed = report.files_processed,
            failed = report.files_failed,
            "folder processed"
        );
        report
    }
}

async fn quarantine<C: ConnectionTrait>(
    conn: &C,
    ctx: &RunContext<'_>,
    row_index: i32,
    raw: &[Value],
    error_message: String,
) -> Result<(), DbErr> {
    quarantined_row::Entity::insert(quarantined_row::ActiveModel {
        id: Set(token::new_id()),
        file_id: Set(ctx.file.file_id.clone()),
        row_index: Set(row_index),
        raw_data: Set(Value::Array(raw.to_vec())),
        error_message: Set(error_message),
        ingestion_run_id: Set(ctx.run_id),
        created_at: Set(Utc::now()),
    })
    .exec(conn)
    .await?;
    Ok(())
}

fn set_fields(am: &mut booking::ActiveModel, fields: Vec<(&'static str, super::sheet::FieldValue)>) -> Result<(), DbErr> {
    for (name, value) in fields {
        let column = booking::Column::from_str(name)
            .map_err(|_| DbErr::Custom(format!("unknown booking column {name}")))?;
        am.set(column, value.into_db());
    }
    Ok(())
}

fn set_provenance(am: &mut booking::ActiveModel, ctx: &RunContext<'_>, hash: String, now: DateTime<Utc>) {
    am.source_file_id = Set(ctx.file.file_id.clone());
    am.source_file_time = Set(ctx.file.data_time);
    am.source_row_hash = Set(hash);
    am.ingestion_run_id = Set(Some(ctx.run_id));
    am.folder_id = Set(Some(ctx.folder_pk));
    am.updated_at = Set(now);
}

/// Audits one row and merges it into `booking`.
async fn apply_row<C: ConnectionTrait>(conn: &C, ctx: &RunContext<'_>, row: &ExtractedRow) -> Result<MergeOutcome, DbErr> {
    let incoming: &BookingRow = &row.booking;
    let hash = row_hash(incoming);
    let now = Utc::now();

    raw_row::Entity::insert(raw_row::ActiveModel {
        id: Set(token::new_id()),
        file_id: Set(ctx.file.file_id.clone()),
        row_index: Set(row.row_index as i32),
        row_hash: Set(hash.clone()),
        raw_data: Set(Value::Array(row.raw.clone())),
        ingestion_run_id: Set(ctx.run_id),
        created_at: Set(now),
    })
    .exec(conn)
    .await?;

    let existing = booking::Entity::find()
        .filter(booking::Column::BookingNumber.eq(incoming.booking_number.as_str()))
        .one(conn)
        .await?;
    let plan = plan_merge(existing.as_ref(), incoming, ctx.file.data_time);
    let outcome = plan.outcome();

    match (plan, existing) {
        (MergePlan::Ignore, _) => {}
        (MergePlan::Insert, _) => {
            let mut am = booking::ActiveModel {
                id: Set(token::new_id()),
                created_at: Set(now),
                ..Default::default()
            };
            set_fields(&mut am, incoming.fields())?;
            set_provenance(&mut am, ctx, hash, now);
            booking::Entity::insert(am).exec(conn).await?;
        }
        (MergePlan::Update { changes, conflicts }, Some(existing)) => {
            for conflict in conflicts {
                booking_conflict::Entity::insert(booking_conflict::ActiveModel {
                    id: Set(token::new_id()),
                    booking_number: Set(existing.booking_number.clone()),
                    field_name: Set(conflict.field.to_string()),
                    existing_value: Set(conflict.existing),
                    incoming_value: Set(conflict.incoming),
                    source_file_id: Set(ctx.file.file_id.clone()),
                    ingestion_run_id: Set(ctx.run_id),
                    detected_at: Set(now),
                })
                .exec(conn)
                .await?;
            }
            let mut am = existing.into_active_model();
            set_fields(&mut am, changes)?;
            set_provenance(&mut am, ctx, hash, now);
            am.update(conn).await?;
        }
        (MergePlan::Update { .. }, None) => {
            return Err(DbErr::RecordNotFound(format!("booking {} vanished", incoming.booking_number)));
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_date_keeps_creation_time_of_day() {
        let created = Utc.with_ymd_and_hms(2025, 9, 30, 14, 5, 0).unwrap();
        assert_eq!(
            data_time_for("bookings_2025-09-28.xlsx", created),
            Utc.with_ymd_and_hms(2025, 9, 28, 14, 5, 0).unwrap()
        );
        assert_eq!(data_time_for("bookings.xlsx", created), created);
    }

    #[test]
    fn drive_file_times() {
        let file = DriveFile {
            id: "f1".into(),
            name: "export 27-09-2025".into(),
            created_time: Some("2025-09-29T01:02:03.000Z".into()),
            modified_time: Some("2025-09-29T05:00:00Z".into()),
            ..Default::default()
        };
        let new = NewFile::from_drive(&file);
        assert_eq!(new.created_time, Utc.with_ymd_and_hms(2025, 9, 29, 1, 2, 3).unwrap());
        assert_eq!(new.modified_time, Utc.with_ymd_and_hms(2025, 9, 29, 5, 0, 0).unwrap());
        assert_eq!(new.data_time, Utc.with_ymd_and_hms(2025, 9, 27, 1, 2, 3).unwrap());
    }
}
