use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::auth::{ServiceAccountKey, TokenProvider};
use super::{DriveFile, DriveSource, FolderDetails, GoogleError, SheetValues, FOLDER_MIME, SPREADSHEET_MIME};

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4";
const FILE_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderMeta {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    modified_time: String,
    #[serde(default)]
    owners: Vec<Owner>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Owner {
    email_address: Option<String>,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Drive v3 + Sheets v4 over REST, authenticated as a service account.
pub struct GoogleClient {
    http: Client,
    tokens: TokenProvider,
}

impl GoogleClient {
    pub fn from_service_account_file(path: &Path) -> Result<Self, GoogleError> {
        let key = ServiceAccountKey::from_file(path)?;
        let http = ClientBuilder::new()
            .user_agent("flowtels/1.0 (+reqwest)")
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(60))
            .build()?;
        let tokens = TokenProvider::new(key, http.clone())?;
        debug!(account = %tokens.client_email(), "google client ready");
        Ok(Self { http, tokens })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, GoogleError> {
        let token = self.tokens.access_token().await?;
        let res = self.http.get(url).bearer_auth(token).query(query).send().await?;
        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(GoogleError::Api { status: status.as_u16(), message });
        }
        Ok(res.json().await?)
    }

    async fn list_query(&self, q: &str, order_by: Option<&str>) -> Result<Vec<DriveFile>, GoogleError> {
        let url = format!("{DRIVE_API}/files");
        let fields = format!("nextPageToken,files({FILE_FIELDS})");
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("q", q), ("fields", fields.as_str()), ("pageSize", "1000")];
            if let Some(order) = order_by {
                query.push(("orderBy", order));
            }
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: FileList = self.get_json(&url, &query).await?;
            files.extend(page.files);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(files)
    }

    async fn first_sheet_title(&self, spreadsheet_id: &str) -> Result<String, GoogleError> {
        let url = format!("{SHEETS_API}/spreadsheets/{}", urlencoding::encode(spreadsheet_id));
        let meta: SpreadsheetMeta = self.get_json(&url, &[("fields", "sheets.properties.title")]).await?;
        meta.sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or(GoogleError::NoSheets)
    }
}

fn in_folder(folder_id: &str) -> String {
    format!("'{}' in parents and trashed=false", folder_id.replace('\'', "\\'"))
}

#[async_trait]
impl DriveSource for GoogleClient {
    async fn folder_details(&self, folder_id: &str) -> Result<Option<FolderDetails>, GoogleError> {
        let url = format!("{DRIVE_API}/files/{}", urlencoding::encode(folder_id));
        let meta: FolderMeta = match self
            .get_json(&url, &[("fields", "id,name,owners,modifiedTime,mimeType")])
            .await
        {
            Ok(meta) => meta,
            Err(GoogleError::Api { status, message })
                if status == StatusCode::NOT_FOUND.as_u16() || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                warn!(folder_id, status, %message, "folder not accessible");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if meta.mime_type != FOLDER_MIME {
            return Ok(None);
        }

        let file_count = self.list_files(folder_id).await?.len();
        let owner = meta
            .owners
            .into_iter()
            .find_map(|o| o.email_address)
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(Some(FolderDetails {
            folder_id: meta.id,
            name: meta.name,
            owner,
            file_count,
            last_modified: meta.modified_time,
        }))
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, GoogleError> {
        self.list_query(&in_folder(folder_id), None).await
    }

    async fn list_spreadsheets(&self, folder_id: &str) -> Result<Vec<DriveFile>, GoogleError> {
        let q = format!("{} and mimeType='{SPREADSHEET_MIME}'", in_folder(folder_id));
        self.list_query(&q, Some("createdTime asc")).await
    }

    async fn read_sheet(&self, spreadsheet_id: &str, sheet: Option<&str>) -> Result<SheetValues, GoogleError> {
        let title = match sheet {
            Some(title) => title.to_string(),
            None => self.first_sheet_title(spreadsheet_id).await?,
        };
        let range = format!("'{title}'!A:AZ");
        let url = format!(
            "{SHEETS_API}/spreadsheets/{}/values/{}",
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(&range)
        );
        let values: ValueRange = self.get_json(&url, &[("valueRenderOption", "UNFORMATTED_VALUE")]).await?;
        Ok(SheetValues { title, rows: values.values })
    }
}
