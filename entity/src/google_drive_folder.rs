use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A Google Drive folder a user has asked to be watched for booking exports.
#[derive(Debug, Clone, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_google_drive_folders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Google Drive folder ID
    #[sea_orm(unique)]
    pub folder_id: String,
    pub folder_name: String,
    pub owner_email: String,
    pub user_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub last_validated: Option<DateTimeUtc>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to   = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::google_drive_watch_config::Entity")]
    WatchConfig,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<super::google_drive_watch_config::Entity> for Entity {
    fn to() -> RelationDef { Relation::WatchConfig.def() }
}

impl ActiveModelBehavior for ActiveModel {}
