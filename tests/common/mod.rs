#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flowtels::config::EnvConfig;
use flowtels::db::postgres_service::PostgresService;
use flowtels::google::{DriveFile, DriveSource, FolderDetails, GoogleError, SheetValues, SPREADSHEET_MIME};
use serde_json::Value;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;

pub mod client;

/// Status of a call whether the service answered with a response or an error.
#[macro_export]
macro_rules! status_of {
    ($app:expr, $req:expr) => {
        match actix_web::test::try_call_service($app, $req).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        }
    };
}

pub struct TestContext {
    pub db: Arc<PostgresService>,
    pub _container: ContainerAsync<Postgres>,
}

impl TestContext {
    pub async fn new() -> TestContext {
        let postgres = Postgres::default();
        let container = postgres.start().await.expect("Failed to start postgres container");

        let host = container.get_host().await.expect("Failed to get host");
        let port = container.get_host_port_ipv4(5432).await.expect("Failed to get port");

        let db_url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let db = Arc::new(
            PostgresService::new(&db_url)
                .await
                .expect("Failed to initialize PostgresService"),
        );

        TestContext {
            db,
            _container: container,
        }
    }
}

/// Config built from an explicit key list, never from the process environment.
pub fn config_from(pairs: &[(&str, &str)]) -> Result<EnvConfig, flowtels::config::ConfigError> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    EnvConfig::from_lookup(|key| vars.get(key).cloned())
}

pub fn get_test_config() -> EnvConfig {
    config_from(&[
        ("DATABASE_URL", "postgresql://unused"), // the app gets its pool from TestContext
        ("EMAIL_BACKEND", "console"),
    ])
    .expect("Failed to build test config")
}

/// Drive stand-in serving folders and sheets from memory.
#[derive(Default)]
pub struct FakeDrive {
    folders: Mutex<HashMap<String, FolderDetails>>,
    files: Mutex<HashMap<String, Vec<DriveFile>>>,
    sheets: Mutex<HashMap<String, SheetValues>>,
}

impl FakeDrive {
    pub fn add_folder(&self, folder_id: &str, name: &str) {
        self.folders.lock().unwrap().insert(
            folder_id.to_string(),
            FolderDetails {
                folder_id: folder_id.to_string(),
                name: name.to_string(),
                owner: "owner@flowtels.com".to_string(),
                file_count: 0,
                last_modified: "2025-09-01T00:00:00Z".to_string(),
            },
        );
    }

    /// Adds a native spreadsheet whose first sheet holds `rows`.
    pub fn add_sheet(&self, folder_id: &str, file_id: &str, name: &str, created: &str, rows: Vec<Vec<Value>>) {
        self.files.lock().unwrap().entry(folder_id.to_string()).or_default().push(DriveFile {
            id: file_id.to_string(),
            name: name.to_string(),
            mime_type: SPREADSHEET_MIME.to_string(),
            created_time: Some(created.to_string()),
            modified_time: Some(created.to_string()),
            size: None,
        });
        self.sheets.lock().unwrap().insert(
            file_id.to_string(),
            SheetValues { title: "Sheet1".to_string(), rows },
        );
    }
}

#[async_trait]
impl DriveSource for FakeDrive {
    async fn folder_details(&self, folder_id: &str) -> Result<Option<FolderDetails>, GoogleError> {
        let count = self.files.lock().unwrap().get(folder_id).map_or(0, Vec::len);
        Ok(self.folders.lock().unwrap().get(folder_id).cloned().map(|mut f| {
            f.file_count = count;
            f
        }))
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, GoogleError> {
        Ok(self.files.lock().unwrap().get(folder_id).cloned().unwrap_or_default())
    }

    async fn list_spreadsheets(&self, folder_id: &str) -> Result<Vec<DriveFile>, GoogleError> {
        let mut files: Vec<DriveFile> = self
            .list_files(folder_id)
            .await?
            .into_iter()
            .filter(|f| f.mime_type == SPREADSHEET_MIME)
            .collect();
        files.sort_by(|a, b| a.created_time.cmp(&b.created_time));
        Ok(files)
    }

    async fn read_sheet(&self, spreadsheet_id: &str, _sheet: Option<&str>) -> Result<SheetValues, GoogleError> {
        self.sheets
            .lock()
            .unwrap()
            .get(spreadsheet_id)
            .cloned()
            .ok_or(GoogleError::Api { status: 404, message: "File not found".to_string() })
    }
}

// Test data helpers
pub mod test_data {
    use serde_json::{json, Value};

    pub fn header() -> Vec<Value> {
        ["No.", "Status", "File As", "Name", "Surname", "Company", "Region", "Portal", "Arrive", "Depart"]
            .iter()
            .map(|h| json!(h))
            .collect()
    }

    /// A booking row with the first twenty-one columns filled.
    pub fn booking(number: &str, status: &str, arrive: &str, room: &str, deposit: &str) -> Vec<Value> {
        vec![
            json!(number),
            json!(status),
            json!("Smith, Jane"),
            json!("Jane"),
            json!("Smith"),
            json!(""),
            json!("QLD"),
            json!("Direct"),
            json!(arrive),
            json!("05/10/2025"),
            json!(room),
            json!("King"),
            json!(deposit),
            json!("$0.00"),
            json!(""),
            json!(""),
            json!("$1,200.00"),
            json!("$1,200.00"),
            json!(""),
            json!(""),
            json!("Jane.Smith@Example.com"),
        ]
    }
}
