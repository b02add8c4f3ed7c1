use actix_web::{post, web};
use std::sync::Arc;

use crate::db::postgres_service::PostgresService;
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::{AuthenticatedUser, RedirectRes};

#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "accounts",
    security(("bearer" = [])),
    responses((status = 200, body = RedirectRes))
)]
#[post("/logout/")]
pub async fn logout(
    db: web::Data<Arc<PostgresService>>,
    auth: web::ReqData<AuthenticatedUser>,
) -> ApiResult<RedirectRes> {
    db.revoke_session(&auth.session_id).await?;
    Ok(ApiResponse::Ok(RedirectRes { redirect: "/".to_string() }))
}
