use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "file_added")]
    FileAdded,
    #[sea_orm(string_value = "file_removed")]
    FileRemoved,
    #[sea_orm(string_value = "file_modified")]
    FileModified,
    #[default]
    #[sea_orm(string_value = "all")]
    All,
}

#[derive(Debug, Clone, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_google_drive_watch_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub folder_id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub webhook_url: Option<String>,
    pub email_notifications: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub resource_id: Option<String>,
    pub expiration: Option<DateTimeUtc>,
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
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to   = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::google_drive_folder::Entity> for Entity {
    fn to() -> RelationDef { Relation::Folder.def() }
}

impl ActiveModelBehavior for ActiveModel {}
