use crate::db::postgres_service::PostgresService;
use crate::{
    types::{error::AppError, token::TokenType, user::AuthenticatedUser},
    utils::token::{self, construct_token, encrypt, extract_token_parts, new_token, verify},
};
use chrono::{DateTime, Duration, Utc};
use entity::auth_token::{ActiveModel as TokenActive, Column, Entity as AuthToken};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

impl PostgresService {
    /// Starts a session and returns the client token with its expiry.
    pub async fn create_session(&self, user_id: &Uuid, age: Duration) -> Result<(String, DateTime<Utc>), AppError> {
        let secret = new_token(TokenType::Session);
        let hashed = encrypt(&secret).map_err(|e| AppError::Internal(e.to_string()))?;
        let id = token::new_id();
        let now = Utc::now();
        let expires_at = now + age;

        AuthToken::insert(TokenActive {
            id: Set(id),
            user_id: Set(*user_id),
            token_hash: Set(hashed),
            created_at: Set(now),
            expires_at: Set(expires_at),
        })
        .exec(&self.database_connection)
        .await?;

        Ok((construct_token(&id, &secret), expires_at))
    }

    /// Resolves a bearer token to its active user.
    pub async fn resolve_session(&self, bearer: &str) -> Result<AuthenticatedUser, AppError> {
        let (session_id, secret) = extract_token_parts(bearer).ok_or(AppError::Unauthorized)?;
        let session = AuthToken::find_by_id(session_id)
            .one(&self.database_connection)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if session.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized);
        }
        if !verify(&secret, &session.token_hash).unwrap_or(false) {
            return Err(AppError::Unauthorized);
        }

        let user = match self.get_user_by_id(&session.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound) => return Err(AppError::Unauthorized),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthenticatedUser {
            user_id: user.id,
            session_id,
            is_superuser: user.is_superuser,
        })
    }

    pub async fn revoke_session(&self, session_id: &Uuid) -> Result<(), AppError> {
        AuthToken::delete_by_id(*session_id)
            .exec(&self.database_connection)
            .await?;
        Ok(())
    }

    /// Ends every session of the user, optionally keeping one.
    pub async fn revoke_user_sessions(&self, user_id: &Uuid, keep: Option<Uuid>) -> Result<u64, AppError> {
        let mut query = AuthToken::delete_many().filter(Column::UserId.eq(*user_id));
        if let Some(keep) = keep {
            query = query.filter(Column::Id.ne(keep));
        }
        Ok(query.exec(&self.database_connection).await?.rows_affected)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        Ok(AuthToken::delete_many()
            .filter(Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.database_connection)
            .await?
            .rows_affected)
    }
}
