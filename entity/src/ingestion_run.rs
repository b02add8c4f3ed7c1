use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[sea_orm(string_value = "running")]
    Running,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// One attempt at importing one spreadsheet file.
#[derive(Debug, Clone, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingestion_run")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub folder_id: Uuid,
    pub file_id: String,
    pub filename: String,
    pub file_created_time: DateTimeUtc,
    pub file_modified_time: DateTimeUtc,
    /// When the data in the file was produced; drives newest-wins merging.
    pub data_time: DateTimeUtc,
    pub status: RunStatus,
    pub sheet_names: Json,
    pub rows_processed: i32,
    pub rows_inserted: i32,
    pub rows_updated: i32,
    pub rows_ignored: i32,
    pub conflicts_detected: i32,
    pub rows_quarantined: i32,
    pub error_message: Option<String>,
    pub started_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::google_drive_folder::Entity",
        from = "Column::FolderId",
        to   = "super::google_drive_folder::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Folder,
}

impl Related<super::google_drive_folder::Entity> for Entity {
    fn to() -> RelationDef { Relation::Folder.def() }
}

impl ActiveModelBehavior for ActiveModel {}
