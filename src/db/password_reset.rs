use crate::db::postgres_service::PostgresService;
use crate::{
    types::{error::AppError, token::TokenType},
    utils::token::{self, construct_token, decode_uid, encode_uid, encrypt_keyed, extract_token_parts, new_token, verify_keyed},
};
use chrono::{Duration, Utc};
use entity::password_reset::{ActiveModel as ResetActive, Column, Entity as PasswordReset};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

pub const RESET_TIMEOUT_DAYS: i64 = 3;

impl PostgresService {
    /// Returns `(uidb64, token)` for the reset link. The stored hash is keyed
    /// with `secret_key`, so rotating it invalidates outstanding links.
    pub async fn create_password_reset(&self, user_id: &Uuid, secret_key: &str) -> Result<(String, String), AppError> {
        let secret = new_token(TokenType::PasswordReset);
        let hashed = encrypt_keyed(&secret, secret_key).map_err(|e| AppError::Internal(e.to_string()))?;
        let id = token::new_id();
        let now = Utc::now();

        PasswordReset::insert(ResetActive {
            id: Set(id),
            user_id: Set(*user_id),
            token_hash: Set(hashed),
            created_at: Set(now),
            expires_at: Set(now + Duration::days(RESET_TIMEOUT_DAYS)),
            used_at: Set(None),
        })
        .exec(&self.database_connection)
        .await?;

        Ok((encode_uid(user_id), construct_token(&id, &secret)))
    }

    /// Checks and burns a reset link. Any mismatch is reported as a bad link.
    pub async fn consume_password_reset(&self, uidb64: &str, token: &str, secret_key: &str) -> Result<Uuid, AppError> {
        let invalid = || AppError::BadRequest("The password reset link was invalid, possibly because it has already been used.".into());

        let user_id = decode_uid(uidb64).ok_or_else(invalid)?;
        let (reset_id, secret) = extract_token_parts(token).ok_or_else(invalid)?;
        let reset = PasswordReset::find_by_id(reset_id)
            .one(&self.database_connection)
            .await?
            .ok_or_else(invalid)?;

        if reset.user_id != user_id
            || reset.used_at.is_some()
            || reset.expires_at <= Utc::now()
            || !verify_keyed(&secret, &reset.token_hash, secret_key).unwrap_or(false)
        {
            return Err(invalid());
        }

        // only one concurrent confirm may flip used_at
        let burned = PasswordReset::update_many()
            .col_expr(Column::UsedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(reset.id))
            .filter(Column::UsedAt.is_null())
            .exec(&self.database_connection)
            .await?;
        if burned.rows_affected != 1 {
            return Err(invalid());
        }
        Ok(user_id)
    }
}
