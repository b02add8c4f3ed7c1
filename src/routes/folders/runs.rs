use actix_web::{get, web};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::db::postgres_service::PostgresService;
use crate::types::error::ErrorBody;
use crate::types::folder::IngestionRunRes;
use crate::types::response::{ApiResponse, ApiResult};
use crate::types::user::AuthenticatedUser;

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 500;

#[derive(Deserialize, IntoParams)]
pub struct RunsQuery {
    /// Most recent runs to return (default 50, max 500).
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/folders/{folder_id}/runs/",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_id" = String, Path, description = "Google Drive folder ID"), RunsQuery),
    responses(
        (status = 200, body = Vec<IngestionRunRes>),
        (status = 404, body = ErrorBody)
    )
)]
#[get("/{folder_id}/runs/")]
pub async fn list_runs(
    db: web::Data<Arc<PostgresService>>,
    auth: web::ReqData<AuthenticatedUser>,
    folder_id: web::Path<String>,
    query: web::Query<RunsQuery>,
) -> ApiResult<Vec<IngestionRunRes>> {
    let folder = db.get_user_folder(&auth.user_id, &folder_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let runs = db.list_folder_runs(folder.id, limit).await?;
    Ok(ApiResponse::Ok(runs.into_iter().map(IngestionRunRes::from).collect()))
}
