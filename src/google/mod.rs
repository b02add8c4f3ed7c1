//! Read-only access to the Google Drive folders and spreadsheets that booking
//! exports are dropped into.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::GoogleConfig;

pub mod auth;
pub mod client;

pub use client::GoogleClient;

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const POLL_WATCH_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("service account file {0} not found")]
    MissingCredentials(String),
    #[error("invalid service account key: {0}")]
    Credentials(String),
    #[error("token exchange failed: {0}")]
    Auth(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("google api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("no sheets found in spreadsheet")]
    NoSheets,
    #[error("google drive access is not configured")]
    NotConfigured,
}

/// File metadata as listed by the Drive v3 API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderDetails {
    pub folder_id: String,
    pub name: String,
    /// First owner's address, `Unknown` when Drive reports none.
    pub owner: String,
    pub file_count: usize,
    pub last_modified: String,
}

/// Cell values of one sheet, rendered unformatted (numbers stay numbers).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetValues {
    pub title: String,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchSetup {
    pub status: &'static str,
    pub folder_id: String,
    pub watch_type: &'static str,
    pub interval: u64,
    pub webhook_url: Option<String>,
}

/// Drive exposes no folder webhooks for service accounts, so watches are
/// served by the poller.
pub fn setup_watch(folder_id: &str, webhook_url: Option<String>) -> WatchSetup {
    WatchSetup {
        status: "success",
        folder_id: folder_id.to_string(),
        watch_type: "polling",
        interval: POLL_WATCH_INTERVAL_SECS,
        webhook_url,
    }
}

/// Where booking spreadsheets come from. Implemented by [`GoogleClient`] and by
/// in-memory sources in tests.
#[async_trait]
pub trait DriveSource: Send + Sync {
    /// `None` when the id does not name a folder.
    async fn folder_details(&self, folder_id: &str) -> Result<Option<FolderDetails>, GoogleError>;

    /// Every non-trashed file in the folder.
    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, GoogleError>;

    /// Native spreadsheets in the folder, oldest first.
    async fn list_spreadsheets(&self, folder_id: &str) -> Result<Vec<DriveFile>, GoogleError>;

    /// Reads `sheet`, or the first sheet when `None`.
    async fn read_sheet(&self, spreadsheet_id: &str, sheet: Option<&str>) -> Result<SheetValues, GoogleError>;
}

/// Shared, possibly absent Drive access. The server starts without a service
/// account; only the folder endpoints need one.
#[derive(Clone, Default)]
pub struct DriveHandle(Option<Arc<dyn DriveSource>>);

impl DriveHandle {
    pub fn new(source: Arc<dyn DriveSource>) -> Self {
        Self(Some(source))
    }

    pub fn unconfigured() -> Self {
        Self(None)
    }

    /// Uses the service account key when it can be loaded, otherwise runs
    /// without Drive access.
    pub fn from_config(config: &GoogleConfig) -> Self {
        match GoogleClient::from_service_account_file(&config.service_account_file) {
            Ok(client) => Self::new(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "google drive access disabled");
                Self::unconfigured()
            }
        }
    }

    pub fn get(&self) -> Result<Arc<dyn DriveSource>, GoogleError> {
        self.0.clone().ok_or(GoogleError::NotConfigured)
    }
}
