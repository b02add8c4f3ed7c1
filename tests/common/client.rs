use std::sync::Arc;

use flowtels::app::{create_app, AppState};
use flowtels::config::EnvConfig;
use flowtels::db::postgres_service::PostgresService;
use flowtels::google::DriveHandle;
use flowtels::types::error::AppError;
use uuid::Uuid;

use super::{get_test_config, FakeDrive};

pub struct TestClient {
    pub db: Arc<PostgresService>,
    pub drive: Arc<FakeDrive>,
    pub config: Arc<EnvConfig>,
}

impl TestClient {
    pub fn new(db: Arc<PostgresService>) -> Self {
        TestClient {
            db,
            drive: Arc::new(FakeDrive::default()),
            config: Arc::new(get_test_config()),
        }
    }

    pub fn with_config(db: Arc<PostgresService>, config: EnvConfig) -> Self {
        TestClient { config: Arc::new(config), ..Self::new(db) }
    }

    pub fn create_app(
        &self,
    ) -> actix_web::App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        create_app(AppState {
            db: Arc::clone(&self.db),
            config: Arc::clone(&self.config),
            drive: DriveHandle::new(self.drive.clone()),
        })
    }

    /// Creates a user and a live session, returning the bearer token.
    pub async fn create_test_user(&self, username: &str, password: &str) -> Result<(Uuid, String), AppError> {
        let email = format!("{username}@test.com");
        let user_id = self
            .db
            .create_user_with_password(username, &email, password, "Test", "User")
            .await?;
        let (token, _) = self.db.create_session(&user_id, self.config.session_age).await?;
        Ok((user_id, token))
    }

    #[allow(dead_code)]
    pub async fn create_test_admin(&self) -> (Uuid, String) {
        let admin_id = self
            .db
            .create_superuser("admin", "admin@test.com", "admin-pass-123")
            .await
            .expect("Failed to create admin");
        let (token, _) = self
            .db
            .create_session(&admin_id, self.config.session_age)
            .await
            .expect("Failed to create admin session");
        (admin_id, token)
    }
}

