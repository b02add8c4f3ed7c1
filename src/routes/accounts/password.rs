use actix_web::{post, web};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EnvConfig;
use crate::db::postgres_service::PostgresService;
use crate::types::error::{AppError, ErrorBody};
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::{AuthenticatedUser, MessageRes, RPasswordChange, RPasswordReset, RPasswordResetConfirm};
use crate::utils::mail::mail_password_reset;
use crate::utils::password::{passwords_match, validate_password};
use crate::utils::token::decode_uid;
use crate::db::user::check_password;

#[utoipa::path(
    post,
    path = "/accounts/password/change/",
    tag = "accounts",
    security(("bearer" = [])),
    request_body = RPasswordChange,
    responses(
        (status = 200, body = MessageRes),
        (status = 400, body = ErrorBody)
    )
)]
#[post("/change/")]
pub async fn change(
    db: web::Data<Arc<PostgresService>>,
    config: web::Data<Arc<EnvConfig>>,
    auth: web::ReqData<AuthenticatedUser>,
    data: web::Json<RPasswordChange>,
) -> ApiResult<MessageRes> {
    let user = db.get_user_by_id(&auth.user_id).await?;
    if !check_password(&user, &data.old_password) {
        return Err(AppError::Validation(
            "Your old password was entered incorrectly. Please enter it again.".into(),
        ));
    }
    passwords_match(&data.new_password1, &data.new_password2)?;
    validate_password(&data.new_password1, &user.username, &user.email, config.password_validation)?;

    db.set_password(&user.id, &data.new_password1).await?;
    // the current session survives, every other one is signed out
    db.revoke_user_sessions(&user.id, Some(auth.session_id)).await?;
    info!(user_id = %user.id, "password changed");

    Ok(ApiResponse::Ok(MessageRes {
        message: "Your password was changed.".to_string(),
    }))
}

/// Always answers the same way so the endpoint cannot be used to probe for accounts.
#[utoipa::path(
    post,
    path = "/accounts/password/reset/",
    tag = "accounts",
    request_body = RPasswordReset,
    responses((status = 200, body = MessageRes))
)]
#[post("/reset/")]
pub async fn reset(
    db: web::Data<Arc<PostgresService>>,
    config: web::Data<Arc<EnvConfig>>,
    data: web::Json<RPasswordReset>,
) -> ApiResult<MessageRes> {
    let sent = MessageRes {
        message: "If an account exists for that email, a password reset link has been sent.".to_string(),
    };

    let user = match db.get_user_by_email(&data.email).await {
        Ok(user) if user.is_active => user,
        Ok(_) | Err(AppError::NotFound) => return Ok(ApiResponse::Ok(sent)),
        Err(e) => return Err(e),
    };

    let (uidb64, token) = db.create_password_reset(&user.id, &config.secret_key).await?;
    if let Err(e) = mail_password_reset(&config.mail, &config.domain, &user.email, &uidb64, &token).await {
        warn!(user_id = %user.id, error = %e, "password reset mail failed");
    }

    Ok(ApiResponse::Ok(sent))
}

#[utoipa::path(
    post,
    path = "/accounts/password/reset/{uidb64}/{token}/",
    tag = "accounts",
    params(
        ("uidb64" = String, Path, description = "Encoded user id from the reset link"),
        ("token" = String, Path, description = "Reset token from the reset link")
    ),
    request_body = RPasswordResetConfirm,
    responses(
        (status = 200, body = MessageRes),
        (status = 400, description = "Link invalid, used or expired", body = ErrorBody)
    )
)]
#[post("/reset/{uidb64}/{token}/")]
pub async fn reset_confirm(
    db: web::Data<Arc<PostgresService>>,
    config: web::Data<Arc<EnvConfig>>,
    path: web::Path<(String, String)>,
    data: web::Json<RPasswordResetConfirm>,
) -> ApiResult<MessageRes> {
    let (uidb64, token) = path.into_inner();
    passwords_match(&data.new_password1, &data.new_password2)?;

    // password rules first so a rejected password does not burn the link
    if let Some(user) = match decode_uid(&uidb64) {
        Some(id) => db.get_user_by_id(&id).await.ok(),
        None => None,
    } {
        validate_password(&data.new_password1, &user.username, &user.email, config.password_validation)?;
    }

    let user_id = db.consume_password_reset(&uidb64, &token, &config.secret_key).await?;
    let user = db.get_user_by_id(&user_id).await?;

    db.set_password(&user.id, &data.new_password1).await?;
    db.revoke_user_sessions(&user.id, None).await?;
    info!(user_id = %user.id, "password reset");

    Ok(ApiResponse::Ok(MessageRes {
        message: "Your password has been set. You may go ahead and log in now.".to_string(),
    }))
}
