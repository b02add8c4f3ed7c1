use crate::openapi::ApiDoc;
use crate::utils::webutils::validate_session;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod accounts;
pub mod folders;
pub mod health;
pub mod user;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let user_auth = HttpAuthentication::bearer(validate_session);

    cfg.service(SwaggerUi::new("/api/docs/{_:.*}").url("/api/schema/", ApiDoc::openapi()));

    cfg.service(
        web::scope("/api")
            .service(health::health)
            .service(
                web::scope("/user")
                    .service(user::profile::profile)
                    .wrap(user_auth.clone()),
            )
            .service(
                web::scope("/folders")
                    .service(folders::manage::list_folders)
                    .service(folders::manage::create_folder)
                    .service(folders::bookings::list_bookings)
                    .service(folders::runs::list_runs)
                    .service(folders::ingest::ingest_now)
                    .wrap(user_auth.clone()),
            ),
    );

    cfg.service(
        web::scope("/accounts")
            .service(accounts::signup::signup)
            .service(accounts::login::login)
            .service(
                web::scope("/password")
                    .service(accounts::password::reset)
                    .service(accounts::password::reset_confirm)
                    .service(
                        web::scope("")
                            .service(accounts::password::change)
                            .wrap(user_auth.clone()),
                    ),
            )
            .service(
                web::scope("")
                    .service(accounts::logout::logout)
                    .wrap(user_auth),
            ),
    );
}
