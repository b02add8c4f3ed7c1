use actix_web::{get, post, web};
use std::sync::Arc;
use tracing::info;

use crate::db::drive::{DBFolderCreate, DBWatchCreate};
use crate::db::postgres_service::PostgresService;
use crate::google::{setup_watch, DriveHandle};
use crate::types::error::{AppError, ErrorBody};
use crate::types::folder::{FolderCreateRes, FolderRes, RFolderCreate, WatchSetupRes};
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/api/folders/",
    tag = "folders",
    security(("bearer" = [])),
    responses((status = 200, body = Vec<FolderRes>))
)]
#[get("/")]
pub async fn list_folders(
    db: web::Data<Arc<PostgresService>>,
    auth: web::ReqData<AuthenticatedUser>,
) -> ApiResult<Vec<FolderRes>> {
    let folders = db.list_user_folders(&auth.user_id).await?;
    Ok(ApiResponse::Ok(folders.into_iter().map(FolderRes::from).collect()))
}

/// Confirms the folder exists and is shared with the service account, then
/// starts watching it.
#[utoipa::path(
    post,
    path = "/api/folders/",
    tag = "folders",
    security(("bearer" = [])),
    request_body = RFolderCreate,
    responses(
        (status = 201, body = FolderCreateRes),
        (status = 400, description = "Not a folder or not shared", body = ErrorBody),
        (status = 409, body = ErrorBody),
        (status = 502, body = ErrorBody)
    )
)]
#[post("/")]
pub async fn create_folder(
    db: web::Data<Arc<PostgresService>>,
    drive: web::Data<DriveHandle>,
    auth: web::ReqData<AuthenticatedUser>,
    data: web::Json<RFolderCreate>,
) -> ApiResult<FolderCreateRes> {
    let data = data.into_inner();
    let folder_id = data.folder_id.trim().to_string();
    if folder_id.is_empty() {
        return Err(AppError::Validation("A Google Drive folder ID is required.".into()));
    }

    let details = drive
        .get()?
        .folder_details(&folder_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Folder not found or not shared with the service account.".into())
        })?;

    let folder = db
        .upsert_folder_with_watch(
            DBFolderCreate {
                folder_id: details.folder_id.clone(),
                folder_name: details.name,
                owner_email: details.owner,
                user_id: auth.user_id,
            },
            DBWatchCreate {
                notification_type: data.notification_type.unwrap_or_default(),
                webhook_url: data.webhook_url.clone(),
                email_notifications: data.email_notifications.unwrap_or(true),
            },
        )
        .await?;
    info!(folder = %folder.folder_id, user_id = %auth.user_id, "watching folder");

    let watch = setup_watch(&folder.folder_id, data.webhook_url);
    Ok(ApiResponse::Created(FolderCreateRes {
        folder: folder.into(),
        file_count: details.file_count,
        watch: WatchSetupRes {
            status: watch.status.to_string(),
            folder_id: watch.folder_id,
            watch_type: watch.watch_type.to_string(),
            interval: watch.interval,
            webhook_url: watch.webhook_url,
        },
    }))
}
