use crate::db::postgres_service::PostgresService;
use crate::{
    types::{error::AppError, user::DBUserCreate},
    utils::token::{self, encrypt, verify},
};
use chrono::Utc;
use entity::user::{ActiveModel as UserActive, Column, Entity as User, Model as UserModel};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

/// Lowercases the domain part, leaving the local part as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

impl PostgresService {
    pub async fn user_exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        Ok(User::find()
            .filter(Column::Email.eq(normalize_email(email)))
            .count(&self.database_connection)
            .await?
            > 0)
    }

    pub async fn user_exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        Ok(User::find()
            .filter(Column::Username.eq(username.trim()))
            .count(&self.database_connection)
            .await?
            > 0)
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<UserModel, AppError> {
        Ok(User::find_by_id(*id)
            .one(&self.database_connection)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("User does not exist".into()))?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserModel, AppError> {
        Ok(User::find()
            .filter(Column::Email.eq(normalize_email(email)))
            .one(&self.database_connection)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("User does not exist".into()))?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<UserModel, AppError> {
        Ok(User::find()
            .filter(Column::Username.eq(username.trim()))
            .one(&self.database_connection)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("User does not exist".into()))?)
    }

    /// Newest accounts first.
    pub async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        Ok(User::find()
            .order_by_desc(Column::DateJoined)
            .all(&self.database_connection)
            .await?)
    }

    /// Signup: create user.
    pub async fn create_user(&self, payload: DBUserCreate) -> Result<Uuid, AppError> {
        let email = normalize_email(&payload.email);
        let username = payload.username.trim().to_string();
        if email.is_empty() {
            return Err(AppError::Validation("An email address is required.".into()));
        }
        if self.user_exists_by_username(&username).await? || self.user_exists_by_email(&email).await? {
            return Err(AppError::AlreadyExists);
        }

        let uid = token::new_id();
        let now = Utc::now();
        let txn = self.database_connection.begin().await?;

        User::insert(UserActive {
            id: Set(uid),
            username: Set(username),
            email: Set(email),
            password: Set(payload.password),
            first_name: Set(payload.first_name),
            last_name: Set(payload.last_name),
            is_staff: Set(payload.is_staff),
            is_superuser: Set(payload.is_superuser),
            is_active: Set(true),
            date_joined: Set(now),
            last_login: Set(None),
            updated_at: Set(now),
        })
        .exec(&txn)
        .await?;

        txn.commit().await?;
        info!(user_id = %uid, "created user");
        Ok(uid)
    }

    /// Hashes `password` and creates a regular account.
    pub async fn create_user_with_password(
        &self,
        username: &str,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Uuid, AppError> {
        let hashed = encrypt(password).map_err(|e| AppError::Internal(e.to_string()))?;
        self.create_user(DBUserCreate {
            username: username.to_string(),
            email: email.to_string(),
            password: hashed,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_staff: false,
            is_superuser: false,
        })
        .await
    }

    pub async fn create_superuser(&self, username: &str, email: &str, password: &str) -> Result<Uuid, AppError> {
        let hashed = encrypt(password).map_err(|e| AppError::Internal(e.to_string()))?;
        self.create_user(DBUserCreate {
            username: username.to_string(),
            email: email.to_string(),
            password: hashed,
            first_name: String::new(),
            last_name: String::new(),
            is_staff: true,
            is_superuser: true,
        })
        .await
    }

    /// Username + password check. Unknown users, wrong passwords and inactive
    /// accounts all fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserModel, AppError> {
        let user = match self.get_user_by_username(username).await {
            Ok(user) => user,
            Err(AppError::NotFound) => return Err(AppError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        if !user.is_active || !check_password(&user, password) {
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn set_password(&self, user_id: &Uuid, password: &str) -> Result<(), AppError> {
        let hashed = encrypt(password).map_err(|e| AppError::Internal(e.to_string()))?;
        let mut am: UserActive = self.get_user_by_id(user_id).await?.into();
        am.password = Set(hashed);
        am.updated_at = Set(Utc::now());
        am.update(&self.database_connection).await?;
        Ok(())
    }

    pub async fn touch_last_login(&self, user_id: &Uuid) -> Result<(), AppError> {
        let mut am: UserActive = self.get_user_by_id(user_id).await?.into();
        let now = Utc::now();
        am.last_login = Set(Some(now));
        am.updated_at = Set(now);
        am.update(&self.database_connection).await?;
        Ok(())
    }

    pub async fn set_user_active(&self, user_id: &Uuid, active: bool) -> Result<(), AppError> {
        let mut am: UserActive = self.get_user_by_id(user_id).await?.into();
        am.is_active = Set(active);
        am.updated_at = Set(Utc::now());
        am.update(&self.database_connection).await?;
        Ok(())
    }
}

pub fn check_password(user: &UserModel, password: &str) -> bool {
    verify(password, &user.password).unwrap_or(false)
}
