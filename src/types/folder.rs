use chrono::{DateTime, Utc};
use entity::google_drive_watch_config::NotificationType;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::utils::timefmt::{brisbane, brisbane_full};

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RFolderCreate {
    /// Google Drive folder ID
    pub folder_id: String,
    #[schema(value_type = Option<String>, example = "all")]
    pub notification_type: Option<NotificationType>,
    pub webhook_url: Option<String>,
    pub email_notifications: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct FolderRes {
    pub id: Uuid,
    pub folder_id: String,
    pub folder_name: String,
    pub owner_email: String,
    pub is_active: bool,
    pub last_validated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<entity::google_drive_folder::Model> for FolderRes {
    fn from(f: entity::google_drive_folder::Model) -> Self {
        Self {
            id: f.id,
            folder_id: f.folder_id,
            folder_name: f.folder_name,
            owner_email: f.owner_email,
            is_active: f.is_active,
            last_validated: f.last_validated,
            created_at: f.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct WatchSetupRes {
    pub status: String,
    pub folder_id: String,
    pub watch_type: String,
    pub interval: u64,
    pub webhook_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct FolderCreateRes {
    pub folder: FolderRes,
    pub file_count: usize,
    pub watch: WatchSetupRes,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct IngestionRunRes {
    pub id: Uuid,
    pub filename: String,
    pub status: String,
    pub rows_processed: i32,
    pub rows_inserted: i32,
    pub rows_updated: i32,
    pub rows_ignored: i32,
    pub conflicts_detected: i32,
    pub rows_quarantined: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub started_at_local: String,
    pub completed_at_local: String,
}

impl From<entity::ingestion_run::Model> for IngestionRunRes {
    fn from(run: entity::ingestion_run::Model) -> Self {
        let status = serde_json::to_value(run.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            id: run.id,
            filename: run.filename,
            status,
            rows_processed: run.rows_processed,
            rows_inserted: run.rows_inserted,
            rows_updated: run.rows_updated,
            rows_ignored: run.rows_ignored,
            conflicts_detected: run.conflicts_detected,
            rows_quarantined: run.rows_quarantined,
            error_message: run.error_message,
            started_at: run.started_at,
            started_at_local: brisbane(Some(run.started_at)),
            completed_at_local: brisbane_full(run.completed_at),
        }
    }
}
