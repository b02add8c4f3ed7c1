use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
pub enum GoogleDriveFolders {
    #[sea_orm(iden = "api_google_drive_folders")]
    Table,
    Id,
    FolderId,
    FolderName,
    OwnerEmail,
    UserId,
    CreatedAt,
    UpdatedAt,
    LastValidated,
    IsActive,
}

#[derive(DeriveIden)]
enum GoogleDriveWatchConfigs {
    #[sea_orm(iden = "api_google_drive_watch_configs")]
    Table,
    Id,
    FolderId,
    UserId,
    NotificationType,
    WebhookUrl,
    EmailNotifications,
    IsActive,
    CreatedAt,
    UpdatedAt,
    ResourceId,
    Expiration,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.create_table(
            Table::create()
                .table(GoogleDriveFolders::Table)
                .if_not_exists()
                .col(ColumnDef::new(GoogleDriveFolders::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(GoogleDriveFolders::FolderId).string_len(255).not_null().unique_key())
                .col(ColumnDef::new(GoogleDriveFolders::FolderName).string_len(255).not_null())
                .col(ColumnDef::new(GoogleDriveFolders::OwnerEmail).string_len(254).not_null())
                .col(ColumnDef::new(GoogleDriveFolders::UserId).uuid().not_null())
                .col(ColumnDef::new(GoogleDriveFolders::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .col(ColumnDef::new(GoogleDriveFolders::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .col(ColumnDef::new(GoogleDriveFolders::LastValidated).timestamp_with_time_zone().null())
                .col(ColumnDef::new(GoogleDriveFolders::IsActive).boolean().not_null().default(true))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_drive_folder_user")
                        .from(GoogleDriveFolders::Table, GoogleDriveFolders::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(GoogleDriveWatchConfigs::Table)
                .if_not_exists()
                .col(ColumnDef::new(GoogleDriveWatchConfigs::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(GoogleDriveWatchConfigs::FolderId).uuid().not_null())
                .col(ColumnDef::new(GoogleDriveWatchConfigs::UserId).uuid().not_null())
                .col(ColumnDef::new(GoogleDriveWatchConfigs::NotificationType).string_len(20).not_null().default("all"))
                .col(ColumnDef::new(GoogleDriveWatchConfigs::WebhookUrl).string().null())
                .col(ColumnDef::new(GoogleDriveWatchConfigs::EmailNotifications).boolean().not_null().default(true))
                .col(ColumnDef::new(GoogleDriveWatchConfigs::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(GoogleDriveWatchConfigs::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .col(ColumnDef::new(GoogleDriveWatchConfigs::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .col(ColumnDef::new(GoogleDriveWatchConfigs::ResourceId).string_len(255).null())
                .col(ColumnDef::new(GoogleDriveWatchConfigs::Expiration).timestamp_with_time_zone().null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_watch_config_folder")
                        .from(GoogleDriveWatchConfigs::Table, GoogleDriveWatchConfigs::FolderId)
                        .to(GoogleDriveFolders::Table, GoogleDriveFolders::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_watch_config_user")
                        .from(GoogleDriveWatchConfigs::Table, GoogleDriveWatchConfigs::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_index(
            Index::create()
                .name("uq_watch_config_folder_user")
                .table(GoogleDriveWatchConfigs::Table)
                .col(GoogleDriveWatchConfigs::FolderId)
                .col(GoogleDriveWatchConfigs::UserId)
                .unique()
                .to_owned(),
        ).await?;

        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(GoogleDriveWatchConfigs::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(GoogleDriveFolders::Table).if_exists().to_owned()).await?;
        Ok(())
    }
}
