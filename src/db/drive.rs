use crate::db::postgres_service::PostgresService;
use crate::{types::error::AppError, utils::token};
use chrono::Utc;
use entity::google_drive_folder::{self as folder, Entity as Folder};
use entity::google_drive_watch_config::{self as watch, Entity as WatchConfig, NotificationType};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

/// Details confirmed against Drive before a folder is stored.
pub struct DBFolderCreate {
    pub folder_id: String,
    pub folder_name: String,
    pub owner_email: String,
    pub user_id: Uuid,
}

pub struct DBWatchCreate {
    pub notification_type: NotificationType,
    pub webhook_url: Option<String>,
    pub email_notifications: bool,
}

impl PostgresService {
    /// Stores the folder (refreshing name, owner and validation time when it
    /// is already known) together with the caller's watch config.
    pub async fn upsert_folder_with_watch(
        &self,
        payload: DBFolderCreate,
        watch_cfg: DBWatchCreate,
    ) -> Result<folder::Model, AppError> {
        let now = Utc::now();
        let txn = self.database_connection.begin().await?;

        let existing = Folder::find()
            .filter(folder::Column::FolderId.eq(payload.folder_id.as_str()))
            .one(&txn)
            .await?;

        let folder_pk = match existing {
            Some(found) if found.user_id != payload.user_id => {
                return Err(AppError::Conflict("Folder is already watched by another user".into()));
            }
            Some(found) => {
                Folder::update(folder::ActiveModel {
                    id: Set(found.id),
                    folder_name: Set(payload.folder_name),
                    owner_email: Set(payload.owner_email),
                    last_validated: Set(Some(now)),
                    is_active: Set(true),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .exec(&txn)
                .await?;
                found.id
            }
            None => {
                let id = token::new_id();
                Folder::insert(folder::ActiveModel {
                    id: Set(id),
                    folder_id: Set(payload.folder_id),
                    folder_name: Set(payload.folder_name),
                    owner_email: Set(payload.owner_email),
                    user_id: Set(payload.user_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    last_validated: Set(Some(now)),
                    is_active: Set(true),
                })
                .exec(&txn)
                .await?;
                id
            }
        };

        WatchConfig::insert(watch::ActiveModel {
            id: Set(token::new_id()),
            folder_id: Set(folder_pk),
            user_id: Set(payload.user_id),
            notification_type: Set(watch_cfg.notification_type),
            webhook_url: Set(watch_cfg.webhook_url),
            email_notifications: Set(watch_cfg.email_notifications),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            resource_id: Set(None),
            expiration: Set(None),
        })
        .on_conflict(
            OnConflict::columns([watch::Column::FolderId, watch::Column::UserId])
                .update_columns([
                    watch::Column::NotificationType,
                    watch::Column::WebhookUrl,
                    watch::Column::EmailNotifications,
                    watch::Column::IsActive,
                    watch::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(&txn)
        .await?;

        let stored = Folder::find_by_id(folder_pk)
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Folder does not exist".into()))?;
        txn.commit().await?;
        Ok(stored)
    }

    pub async fn list_user_folders(&self, user_id: &Uuid) -> Result<Vec<folder::Model>, AppError> {
        Ok(Folder::find()
            .filter(folder::Column::UserId.eq(*user_id))
            .order_by_desc(folder::Column::CreatedAt)
            .all(&self.database_connection)
            .await?)
    }

    pub async fn get_folder_by_drive_id(&self, folder_id: &str) -> Result<folder::Model, AppError> {
        Ok(Folder::find()
            .filter(folder::Column::FolderId.eq(folder_id))
            .one(&self.database_connection)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Folder does not exist".into()))?)
    }

    /// Same as [`get_folder_by_drive_id`](Self::get_folder_by_drive_id) but
    /// hides folders owned by someone else.
    pub async fn get_user_folder(&self, user_id: &Uuid, folder_id: &str) -> Result<folder::Model, AppError> {
        let found = self.get_folder_by_drive_id(folder_id).await?;
        if found.user_id != *user_id {
            return Err(AppError::NotFound);
        }
        Ok(found)
    }

    /// Active folders that have at least one active watch.
    pub async fn list_watched_folders(&self) -> Result<Vec<folder::Model>, DbErr> {
        Folder::find()
            .join(JoinType::InnerJoin, folder::Relation::WatchConfig.def())
            .filter(folder::Column::IsActive.eq(true))
            .filter(watch::Column::IsActive.eq(true))
            .distinct()
            .order_by_asc(folder::Column::CreatedAt)
            .all(&self.database_connection)
            .await
    }

    pub async fn list_folder_watches(&self, folder_pk: &Uuid) -> Result<Vec<watch::Model>, AppError> {
        Ok(WatchConfig::find()
            .filter(watch::Column::FolderId.eq(*folder_pk))
            .all(&self.database_connection)
            .await?)
    }

    pub async fn deactivate_folder(&self, folder_pk: &Uuid) -> Result<(), AppError> {
        Folder::update(folder::ActiveModel {
            id: Set(*folder_pk),
            is_active: Set(false),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .exec(&self.database_connection)
        .await?;
        Ok(())
    }
}
