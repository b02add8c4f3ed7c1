use crate::db::postgres_service::PostgresService;
use crate::{types::error::AppError, utils::token};
use chrono::Utc;
use entity::{auth_group, group_permission, user_group};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

impl PostgresService {
    pub async fn create_group(&self, name: &str) -> Result<Uuid, AppError> {
        let id = token::new_id();
        auth_group::Entity::insert(auth_group::ActiveModel {
            id: Set(id),
            name: Set(name.trim().to_string()),
        })
        .exec(&self.database_connection)
        .await?;
        Ok(id)
    }

    pub async fn add_user_to_group(&self, user_id: Uuid, group_id: Uuid) -> Result<(), AppError> {
        user_group::Entity::insert(user_group::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([user_group::Column::UserId, user_group::Column::GroupId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&self.database_connection)
        .await?;
        Ok(())
    }

    pub async fn grant_group_permission(&self, group_id: Uuid, codename: &str) -> Result<(), AppError> {
        group_permission::Entity::insert(group_permission::ActiveModel {
            group_id: Set(group_id),
            codename: Set(codename.to_string()),
        })
        .on_conflict(
            OnConflict::columns([group_permission::Column::GroupId, group_permission::Column::Codename])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&self.database_connection)
        .await?;
        Ok(())
    }

    pub async fn list_user_groups(&self, user_id: Uuid) -> Result<Vec<auth_group::Model>, AppError> {
        Ok(auth_group::Entity::find()
            .join(JoinType::InnerJoin, auth_group::Relation::UserGroup.def())
            .filter(user_group::Column::UserId.eq(user_id))
            .all(&self.database_connection)
            .await?)
    }

    /// Inactive users have no permissions, superusers have all of them.
    pub async fn has_perm(&self, user_id: &Uuid, codename: &str) -> Result<bool, AppError> {
        let user = self.get_user_by_id(user_id).await?;
        if !user.is_active {
            return Ok(false);
        }
        if user.is_superuser {
            return Ok(true);
        }
        let granted = group_permission::Entity::find()
            .join(JoinType::InnerJoin, group_permission::Relation::Group.def())
            .join(JoinType::InnerJoin, auth_group::Relation::UserGroup.def())
            .filter(user_group::Column::UserId.eq(*user_id))
            .filter(group_permission::Column::Codename.eq(codename))
            .count(&self.database_connection)
            .await?;
        Ok(granted > 0)
    }
}
