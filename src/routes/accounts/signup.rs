use actix_web::{post, web};
use std::sync::Arc;
use tracing::info;

use crate::config::EnvConfig;
use crate::db::postgres_service::PostgresService;
use crate::types::error::{AppError, ErrorBody};
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::{LoginRes, RSignup};
use crate::utils::password::{passwords_match, validate_password};

use super::login_redirect;

const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "Ensure the {field} has at most {max} characters."
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/accounts/signup/",
    tag = "accounts",
    request_body = RSignup,
    responses(
        (status = 201, description = "Account created and logged in", body = LoginRes),
        (status = 400, body = ErrorBody),
        (status = 409, description = "Username or email taken", body = ErrorBody)
    )
)]
#[post("/signup/")]
pub async fn signup(
    db: web::Data<Arc<PostgresService>>,
    config: web::Data<Arc<EnvConfig>>,
    data: web::Json<RSignup>,
) -> ApiResult<LoginRes> {
    let data = data.into_inner();
    if data.username.trim().is_empty() {
        return Err(AppError::Validation("A username is required.".into()));
    }
    if !data.email.contains('@') {
        return Err(AppError::Validation("Enter a valid email address.".into()));
    }
    check_len("username", &data.username, MAX_NAME_LEN)?;
    check_len("email", &data.email, MAX_EMAIL_LEN)?;
    check_len("first name", &data.first_name, MAX_NAME_LEN)?;
    check_len("last name", &data.last_name, MAX_NAME_LEN)?;
    passwords_match(&data.password1, &data.password2)?;
    validate_password(&data.password1, &data.username, &data.email, config.password_validation)?;

    let user_id = db
        .create_user_with_password(&data.username, &data.email, &data.password1, &data.first_name, &data.last_name)
        .await?;
    info!(%user_id, "signup");

    let user = db.get_user_by_id(&user_id).await?;
    let (token, expires_at) = db.create_session(&user.id, config.session_age).await?;
    db.touch_last_login(&user.id).await?;

    Ok(ApiResponse::Created(LoginRes {
        token,
        expires_at,
        redirect: login_redirect(&user, None),
    }))
}
