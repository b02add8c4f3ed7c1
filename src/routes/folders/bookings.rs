use actix_web::{get, web};
use std::sync::Arc;

use crate::db::postgres_service::PostgresService;
use crate::types::booking::BookingRes;
use crate::types::error::ErrorBody;
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/api/folders/{folder_id}/bookings/",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_id" = String, Path, description = "Google Drive folder ID")),
    responses(
        (status = 200, body = Vec<BookingRes>),
        (status = 404, body = ErrorBody)
    )
)]
#[get("/{folder_id}/bookings/")]
pub async fn list_bookings(
    db: web::Data<Arc<PostgresService>>,
    auth: web::ReqData<AuthenticatedUser>,
    folder_id: web::Path<String>,
) -> ApiResult<Vec<BookingRes>> {
    let folder = db.get_user_folder(&auth.user_id, &folder_id).await?;
    let bookings = db.list_folder_bookings(folder.id).await?;
    Ok(ApiResponse::Ok(bookings.into_iter().map(BookingRes::from).collect()))
}
