use std::collections::HashSet;

use chrono::{DateTime, Utc};
use entity::{
    booking, booking_conflict,
    ingestion_run::{self, RunStatus},
    processed_file, quarantined_row,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::db::postgres_service::PostgresService;
use crate::ingest::{NewFile, RunStats};
use crate::utils::token;

impl PostgresService {
    /// Opens a run in `running` state. Committed on its own so a failed file
    /// still leaves a record behind.
    pub async fn create_run(&self, folder_pk: Uuid, file: &NewFile) -> Result<ingestion_run::Model, DbErr> {
        ingestion_run::ActiveModel {
            id: Set(token::new_id()),
            folder_id: Set(folder_pk),
            file_id: Set(file.file_id.clone()),
            filename: Set(file.filename.clone()),
            file_created_time: Set(file.created_time),
            file_modified_time: Set(file.modified_time),
            data_time: Set(file.data_time),
            status: Set(RunStatus::Running),
            sheet_names: Set(serde_json::json!([])),
            rows_processed: Set(0),
            rows_inserted: Set(0),
            rows_updated: Set(0),
            rows_ignored: Set(0),
            conflicts_detected: Set(0),
            rows_quarantined: Set(0),
            error_message: Set(None),
            started_at: Set(Utc::now()),
            completed_at: Set(None),
        }
        .insert(&self.database_connection)
        .await
    }

    /// `completed` when nothing was quarantined, `partial` otherwise.
    pub async fn finish_run(&self, run: ingestion_run::Model, stats: &RunStats) -> Result<ingestion_run::Model, DbErr> {
        let status = if stats.rows_quarantined == 0 {
            RunStatus::Completed
        } else {
            RunStatus::Partial
        };
        let mut am = run.into_active_model();
        am.status = Set(status);
        am.sheet_names = Set(serde_json::json!(stats.sheet_names));
        am.rows_processed = Set(stats.rows_processed);
        am.rows_inserted = Set(stats.rows_inserted);
        am.rows_updated = Set(stats.rows_updated);
        am.rows_ignored = Set(stats.rows_ignored);
        am.conflicts_detected = Set(stats.conflicts_detected);
        am.rows_quarantined = Set(stats.rows_quarantined);
        am.completed_at = Set(Some(Utc::now()));
        am.update(&self.database_connection).await
    }

    pub async fn fail_run(&self, run: ingestion_run::Model, message: String) -> Result<ingestion_run::Model, DbErr> {
        let mut am = run.into_active_model();
        am.status = Set(RunStatus::Failed);
        am.error_message = Set(Some(message));
        am.completed_at = Set(Some(Utc::now()));
        am.update(&self.database_connection).await
    }

    pub async fn processed_file_ids(&self, folder_pk: Uuid) -> Result<HashSet<String>, DbErr> {
        let ids: Vec<String> = processed_file::Entity::find()
            .select_only()
            .column(processed_file::Column::FileId)
            .filter(processed_file::Column::FolderId.eq(folder_pk))
            .into_tuple()
            .all(&self.database_connection)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Files among `file_ids` with a completed or partial run started at or after `since`.
    pub async fn recently_ingested(&self, file_ids: &[String], since: DateTime<Utc>) -> Result<HashSet<String>, DbErr> {
        if file_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<String> = ingestion_run::Entity::find()
            .select_only()
            .column(ingestion_run::Column::FileId)
            .filter(ingestion_run::Column::FileId.is_in(file_ids.iter().cloned()))
            .filter(ingestion_run::Column::StartedAt.gte(since))
            .filter(ingestion_run::Column::Status.is_in([RunStatus::Completed, RunStatus::Partial]))
            .distinct()
            .into_tuple()
            .all(&self.database_connection)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Newest first.
    pub async fn list_folder_runs(&self, folder_pk: Uuid, limit: u64) -> Result<Vec<ingestion_run::Model>, DbErr> {
        ingestion_run::Entity::find()
            .filter(ingestion_run::Column::FolderId.eq(folder_pk))
            .order_by_desc(ingestion_run::Column::StartedAt)
            .limit(limit)
            .all(&self.database_connection)
            .await
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<ingestion_run::Model, DbErr> {
        ingestion_run::Entity::find_by_id(run_id)
            .one(&self.database_connection)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Ingestion run does not exist".into()))
    }

    pub async fn list_folder_bookings(&self, folder_pk: Uuid) -> Result<Vec<booking::Model>, DbErr> {
        booking::Entity::find()
            .filter(booking::Column::FolderId.eq(folder_pk))
            .order_by_asc(booking::Column::ArriveDate)
            .order_by_asc(booking::Column::BookingNumber)
            .all(&self.database_connection)
            .await
    }

    pub async fn get_booking(&self, booking_number: &str) -> Result<Option<booking::Model>, DbErr> {
        booking::Entity::find()
            .filter(booking::Column::BookingNumber.eq(booking_number))
            .one(&self.database_connection)
            .await
    }

    pub async fn list_run_quarantine(&self, run_id: Uuid) -> Result<Vec<quarantined_row::Model>, DbErr> {
        quarantined_row::Entity::find()
            .filter(quarantined_row::Column::IngestionRunId.eq(run_id))
            .order_by_asc(quarantined_row::Column::RowIndex)
            .all(&self.database_connection)
            .await
    }

    pub async fn list_booking_conflicts(&self, booking_number: &str) -> Result<Vec<booking_conflict::Model>, DbErr> {
        booking_conflict::Entity::find()
            .filter(booking_conflict::Column::BookingNumber.eq(booking_number))
            .order_by_asc(booking_conflict::Column::DetectedAt)
            .all(&self.database_connection)
            .await
    }
}
