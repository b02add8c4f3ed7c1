use actix_web::{post, web};
use std::sync::Arc;

use crate::db::postgres_service::PostgresService;
use crate::google::DriveHandle;
use crate::ingest::{BookingIngestor, FolderReport};
use crate::types::error::ErrorBody;
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::AuthenticatedUser;

/// Runs discovery and ingestion for the folder right away instead of
/// waiting for the poller.
#[utoipa::path(
    post,
    path = "/api/folders/{folder_id}/ingest/",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_id" = String, Path, description = "Google Drive folder ID")),
    responses(
        (status = 200, body = FolderReport),
        (status = 404, body = ErrorBody),
        (status = 502, body = ErrorBody)
    )
)]
#[post("/{folder_id}/ingest/")]
pub async fn ingest_now(
    db: web::Data<Arc<PostgresService>>,
    drive: web::Data<DriveHandle>,
    auth: web::ReqData<AuthenticatedUser>,
    folder_id: web::Path<String>,
) -> ApiResult<FolderReport> {
    let folder = db.get_user_folder(&auth.user_id, &folder_id).await?;
    let ingestor = BookingIngestor::new(db.get_ref().as_ref().clone(), drive.get()?);
    Ok(ApiResponse::Ok(ingestor.process_folder(&folder).await))
}
