use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::{header, Method},
    middleware::{from_fn, DefaultHeaders, Logger, Next},
    web, App, Error, HttpResponse, HttpServer, ResponseError,
};
use tracing::{info, warn};

use crate::config::EnvConfig;
use crate::db::postgres_service::PostgresService;
use crate::google::DriveHandle;
use crate::routes::configure_routes;
use crate::types::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<PostgresService>,
    pub config: Arc<EnvConfig>,
    pub drive: DriveHandle,
}

pub fn create_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let config = state.config.clone();

    let json_cfg = web::JsonConfig::default()
        .limit(config.max_body_bytes)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());

    let mut app = App::new()
        .app_data(web::Data::new(state.db.clone()))
        .app_data(web::Data::new(state.config.clone()))
        .app_data(web::Data::new(state.drive.clone()))
        .app_data(json_cfg)
        .configure(configure_routes)
        .service(Files::new("/static", config.paths.static_root.clone()));

    if config.debug {
        app = app.service(Files::new("/media", config.paths.media_root.clone()));
    }

    app.wrap(from_fn(request_guard))
        .wrap(security_headers(&config))
        .wrap(cors(&config))
        .wrap(Logger::new("%a \"%r\" %s %b %Dms"))
}

fn cors(config: &EnvConfig) -> Cors {
    if config.cors.allow_all {
        return Cors::permissive();
    }
    let mut cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);
    for origin in &config.cors.allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    if config.cors.allow_credentials {
        cors = cors.supports_credentials();
    }
    cors
}

fn security_headers(config: &EnvConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::REFERRER_POLICY, "same-origin"));
    if config.security.content_type_nosniff {
        headers = headers.add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"));
    }
    if config.security.browser_xss_filter {
        headers = headers.add((header::X_XSS_PROTECTION, "1; mode=block"));
    }
    if let Some(hsts) = config.hsts_header() {
        headers = headers.add((header::STRICT_TRANSPORT_SECURITY, hsts));
    }
    headers
}

fn is_unsafe(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

/// `scheme://host[:port]` of an Origin or Referer value.
fn origin_of(value: &str) -> Option<String> {
    let url = reqwest::Url::parse(value).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    })
}

fn origin_trusted(config: &EnvConfig, origin: &str, request_host: &str, scheme: &str) -> bool {
    if config.cors.allow_all {
        return true;
    }
    if origin == format!("{scheme}://{request_host}") {
        return true;
    }
    config
        .csrf_trusted_origins
        .iter()
        .chain(config.cors.allowed_origins.iter())
        .any(|trusted| trusted.trim_end_matches('/') == origin)
}

/// Host allow-list, HTTPS redirect and cross-origin write protection.
async fn request_guard<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let rejection = match req.app_data::<web::Data<Arc<EnvConfig>>>() {
        Some(config) => reject(config, &req),
        None => None,
    };
    match rejection {
        Some(response) => Ok(req.into_response(response).map_into_right_body()),
        None => next.call(req).await.map(ServiceResponse::map_into_left_body),
    }
}

fn reject(config: &EnvConfig, req: &ServiceRequest) -> Option<HttpResponse> {
    let (host, scheme) = {
        let info = req.connection_info();
        (info.host().to_string(), info.scheme().to_string())
    };

    if !config.host_allowed(&host) {
        warn!(%host, "rejected request for disallowed host");
        return Some(AppError::DisallowedHost(host).error_response());
    }

    let forwarded_https = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("https"));
    if config.security.ssl_redirect && scheme != "https" && !forwarded_https {
        let target = format!("https://{host}{}", req.uri());
        return Some(
            HttpResponse::MovedPermanently()
                .insert_header((header::LOCATION, target))
                .finish(),
        );
    }

    if is_unsafe(req.method()) {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .and_then(origin_of);
        if let Some(origin) = origin {
            if !origin_trusted(config, &origin, &host, &scheme) {
                warn!(%origin, path = %req.path(), "rejected cross-origin write");
                return Some(AppError::Forbidden.error_response());
            }
        }
    }
    None
}

pub async fn serve(state: AppState) -> std::io::Result<()> {
    let port = state.config.port;
    let workers = state.config.workers;
    info!(port, profile = ?state.config.profile, "starting server");

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if let Some(workers) = workers {
        server = server.workers(workers);
    }
    server.bind(("0.0.0.0", port))?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_normalisation() {
        assert_eq!(origin_of("https://flowtels.com/path?x=1").as_deref(), Some("https://flowtels.com"));
        assert_eq!(origin_of("http://localhost:3000").as_deref(), Some("http://localhost:3000"));
        assert_eq!(origin_of("null"), None);
    }
}
