use std::sync::Arc;

use actix_web::{dev::ServiceRequest, web, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use tracing::error;

use crate::db::postgres_service::PostgresService;
use crate::types::error::AppError;

pub fn decode_all(input: &str) -> Option<String> {
    urlencoding::decode(input).ok().map(|cow| cow.into_owned())
}

/// Bearer validator: resolves the session token and stores the
/// [`AuthenticatedUser`](crate::types::user::AuthenticatedUser) in the request extensions.
pub async fn validate_session(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let Some(db) = req.app_data::<web::Data<Arc<PostgresService>>>().cloned() else {
        error!("database missing from app data");
        return Err((AppError::Internal("database unavailable".into()).into(), req));
    };

    let token = decode_all(credentials.token()).unwrap_or_else(|| credentials.token().to_string());
    match db.resolve_session(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(e) => Err((e.into(), req)),
    }
}

/// Only relative, same-site paths are followed after login.
pub fn safe_redirect(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        Some(next.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_stay_on_site() {
        assert_eq!(safe_redirect(Some("/bookings/")), Some("/bookings/".into()));
        assert_eq!(safe_redirect(Some("//evil.example")), None);
        assert_eq!(safe_redirect(Some("https://evil.example")), None);
        assert_eq!(safe_redirect(None), None);
    }
}
