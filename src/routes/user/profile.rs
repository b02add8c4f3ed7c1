use actix_web::{get, web};
use std::sync::Arc;

use crate::db::postgres_service::PostgresService;
use crate::types::error::ErrorBody;
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::{AuthenticatedUser, UserProfileRes};

#[utoipa::path(
    get,
    path = "/api/user/profile/",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserProfileRes),
        (status = 401, body = ErrorBody)
    )
)]
#[get("/profile/")]
pub async fn profile(
    db: web::Data<Arc<PostgresService>>,
    auth: web::ReqData<AuthenticatedUser>,
) -> ApiResult<UserProfileRes> {
    let user = db.get_user_by_id(&auth.user_id).await?;
    Ok(ApiResponse::Ok(user.into()))
}
