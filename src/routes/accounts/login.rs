use actix_web::{post, web};
use std::sync::Arc;
use tracing::info;

use crate::config::EnvConfig;
use crate::db::postgres_service::PostgresService;
use crate::types::error::ErrorBody;
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::{LoginRes, RLogin};

use super::login_redirect;

#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "accounts",
    request_body = RLogin,
    responses(
        (status = 200, body = LoginRes),
        (status = 401, description = "Wrong username or password", body = ErrorBody)
    )
)]
#[post("/login/")]
pub async fn login(
    db: web::Data<Arc<PostgresService>>,
    config: web::Data<Arc<EnvConfig>>,
    data: web::Json<RLogin>,
) -> ApiResult<LoginRes> {
    let user = db.authenticate(&data.username, &data.password).await?;
    let (token, expires_at) = db.create_session(&user.id, config.session_age).await?;
    db.touch_last_login(&user.id).await?;
    info!(user_id = %user.id, "login");

    Ok(ApiResponse::Ok(LoginRes {
        token,
        expires_at,
        redirect: login_redirect(&user, data.next.as_deref()),
    }))
}
