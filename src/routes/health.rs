use actix_web::get;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::response::{ApiResponse, ApiResult};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct Response {
    #[schema(example = "ok")]
    pub status: String,
}

/// Liveness probe for load balancers and container health checks.
#[utoipa::path(
    get,
    path = "/api/health/",
    tag = "health",
    responses((status = 200, description = "Service is up", body = Response))
)]
#[get("/health/")]
pub async fn health(_req: actix_web::HttpRequest) -> ApiResult<Response> {
    Ok(ApiResponse::Ok(Response { status: "ok".to_string() }))
}
