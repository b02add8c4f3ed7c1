use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::ingest::service::FileFailure;
use crate::ingest::FolderReport;
use crate::routes;
use crate::types::booking::BookingRes;
use crate::types::error::ErrorBody;
use crate::types::folder::{FolderCreateRes, FolderRes, IngestionRunRes, RFolderCreate, WatchSetupRes};
use crate::types::user::{
    LoginRes, MessageRes, RLogin, RPasswordChange, RPasswordReset, RPasswordResetConfirm, RSignup,
    RedirectRes, UserProfileRes,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::user::profile::profile,
        routes::accounts::signup::signup,
        routes::accounts::login::login,
        routes::accounts::logout::logout,
        routes::accounts::password::change,
        routes::accounts::password::reset,
        routes::accounts::password::reset_confirm,
        routes::folders::manage::list_folders,
        routes::folders::manage::create_folder,
        routes::folders::bookings::list_bookings,
        routes::folders::runs::list_runs,
        routes::folders::ingest::ingest_now,
    ),
    components(schemas(
        routes::health::Response,
        ErrorBody,
        RSignup,
        RLogin,
        LoginRes,
        RedirectRes,
        RPasswordChange,
        RPasswordReset,
        RPasswordResetConfirm,
        MessageRes,
        UserProfileRes,
        RFolderCreate,
        FolderRes,
        FolderCreateRes,
        WatchSetupRes,
        IngestionRunRes,
        BookingRes,
        FolderReport,
        FileFailure,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "accounts", description = "Signup, login and password management"),
        (name = "user", description = "The signed-in user"),
        (name = "folders", description = "Watched Drive folders and booking ingestion"),
    ),
    info(title = "Flowtels API", description = "Hotel booking ingestion backend")
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
