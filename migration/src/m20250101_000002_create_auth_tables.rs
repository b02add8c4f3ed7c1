use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AuthGroup {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum UserGroup {
    Table,
    UserId,
    GroupId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GroupPermission {
    Table,
    GroupId,
    Codename,
}

#[derive(DeriveIden)]
enum AuthToken {
    Table,
    Id,
    UserId,
    TokenHash,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum PasswordReset {
    Table,
    Id,
    UserId,
    TokenHash,
    CreatedAt,
    ExpiresAt,
    UsedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.create_table(
            Table::create()
                .table(AuthGroup::Table)
                .if_not_exists()
                .col(ColumnDef::new(AuthGroup::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(AuthGroup::Name).string_len(150).not_null().unique_key())
                .to_owned(),
        ).await?;

        // user <-> group memberships
        m.create_table(
            Table::create()
                .table(UserGroup::Table)
                .if_not_exists()
                .col(ColumnDef::new(UserGroup::UserId).uuid().not_null())
                .col(ColumnDef::new(UserGroup::GroupId).uuid().not_null())
                .col(ColumnDef::new(UserGroup::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .primary_key(
                    Index::create()
                        .name("pk_user_group")
                        .col(UserGroup::UserId)
                        .col(UserGroup::GroupId)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_user_group_user")
                        .from(UserGroup::Table, UserGroup::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_user_group_group")
                        .from(UserGroup::Table, UserGroup::GroupId)
                        .to(AuthGroup::Table, AuthGroup::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(GroupPermission::Table)
                .if_not_exists()
                .col(ColumnDef::new(GroupPermission::GroupId).uuid().not_null())
                .col(ColumnDef::new(GroupPermission::Codename).string_len(100).not_null())
                .primary_key(
                    Index::create()
                        .name("pk_group_permission")
                        .col(GroupPermission::GroupId)
                        .col(GroupPermission::Codename)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_group_permission_group")
                        .from(GroupPermission::Table, GroupPermission::GroupId)
                        .to(AuthGroup::Table, AuthGroup::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(AuthToken::Table)
                .if_not_exists()
                .col(ColumnDef::new(AuthToken::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(AuthToken::UserId).uuid().not_null())
                .col(ColumnDef::new(AuthToken::TokenHash).string().not_null())
                .col(ColumnDef::new(AuthToken::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(AuthToken::ExpiresAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_auth_token_user")
                        .from(AuthToken::Table, AuthToken::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_index(
            Index::create()
                .name("idx_auth_token_user")
                .table(AuthToken::Table)
                .col(AuthToken::UserId)
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(PasswordReset::Table)
                .if_not_exists()
                .col(ColumnDef::new(PasswordReset::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(PasswordReset::UserId).uuid().not_null())
                .col(ColumnDef::new(PasswordReset::TokenHash).string().not_null())
                .col(ColumnDef::new(PasswordReset::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(PasswordReset::ExpiresAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(PasswordReset::UsedAt).timestamp_with_time_zone().null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_password_reset_user")
                        .from(PasswordReset::Table, PasswordReset::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(PasswordReset::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(AuthToken::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(GroupPermission::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(UserGroup::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(AuthGroup::Table).if_exists().to_owned()).await?;
        Ok(())
    }
}
