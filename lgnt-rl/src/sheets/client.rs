//! Google Sheets v4 REST client

use super::auth::{ServiceAccountCredentials, TokenProvider};
use super::{SpreadsheetClient, ValueRange, WorksheetInfo};
use crate::error::{SheetsError, SheetsResult};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const USER_AGENT: &str = concat!("lgnt-rl/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    // Zero-valued fields may be left out of responses
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: usize,
}

impl From<SheetProperties> for WorksheetInfo {
    fn from(p: SheetProperties) -> Self {
        WorksheetInfo {
            sheet_id: p.sheet_id,
            title: p.title,
            index: p.index,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Quote a worksheet title for A1 notation
pub fn quoted_range(worksheet: &str, range: Option<&str>) -> String {
    let quoted = format!("'{}'", worksheet.replace('\'', "''"));
    match range {
        Some(r) => format!("{}!{}", quoted, r),
        None => quoted,
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Escape a value for a Drive `q` string literal
fn drive_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Client bound to one spreadsheet
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    /// Open a spreadsheet by id, or by name when no id is given
    pub async fn open(
        creds: ServiceAccountCredentials,
        spreadsheet_id: Option<&str>,
        name: Option<&str>,
    ) -> SheetsResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let tokens = TokenProvider::new(creds, http.clone());

        let spreadsheet_id = match (spreadsheet_id, name) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => Self::find_by_name(&http, &tokens, name).await?,
            (None, None) => {
                return Err(SheetsError::NotFound(
                    "no spreadsheet id or name configured".to_string(),
                ))
            }
        };

        info!(
            spreadsheet_id = %spreadsheet_id,
            client_email = %tokens.client_email(),
            "Opened spreadsheet"
        );
        Ok(Self {
            http,
            tokens,
            spreadsheet_id,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn find_by_name(
        http: &reqwest::Client,
        tokens: &TokenProvider,
        name: &str,
    ) -> SheetsResult<String> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            drive_literal(name),
            SPREADSHEET_MIME
        );
        debug!(name, "Searching Drive for spreadsheet");
        let response = http
            .get(DRIVE_FILES_API)
            .bearer_auth(tokens.access_token().await?)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .send()
            .await?;
        let list: DriveFileList = parse_json(response).await?;
        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| SheetsError::NotFound(format!("spreadsheet '{}'", name)))
    }

    fn spreadsheet_url(&self, suffix: &str) -> String {
        format!("{}/{}{}", SHEETS_API, self.spreadsheet_id, suffix)
    }

    async fn post(&self, url: &str, body: &Value) -> SheetsResult<Value> {
        let response = self
            .http
            .post(url)
            .bearer_auth(self.tokens.access_token().await?)
            .json(body)
            .send()
            .await?;
        parse_json(response).await
    }

    async fn batch_update(&self, requests: Vec<Value>) -> SheetsResult<Value> {
        let url = self.spreadsheet_url(":batchUpdate");
        self.post(&url, &json!({ "requests": requests })).await
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> SheetsResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetsError::Api {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| SheetsError::Parse(e.to_string()))
}

#[async_trait]
impl SpreadsheetClient for GoogleSheetsClient {
    async fn worksheets(&self) -> SheetsResult<Vec<WorksheetInfo>> {
        let response = self
            .http
            .get(self.spreadsheet_url(""))
            .bearer_auth(self.tokens.access_token().await?)
            .query(&[("fields", "sheets.properties")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = parse_json(response).await?;
        let mut sheets: Vec<WorksheetInfo> =
            meta.sheets.into_iter().map(|s| s.properties.into()).collect();
        sheets.sort_by_key(|s| s.index);
        Ok(sheets)
    }

    async fn add_worksheet(
        &self,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> SheetsResult<WorksheetInfo> {
        let reply = self
            .batch_update(vec![json!({
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            })])
            .await?;
        let properties = reply
            .pointer("/replies/0/addSheet/properties")
            .cloned()
            .ok_or_else(|| SheetsError::Parse("addSheet reply missing properties".to_string()))?;
        let properties: SheetProperties =
            serde_json::from_value(properties).map_err(|e| SheetsError::Parse(e.to_string()))?;
        debug!(title, sheet_id = properties.sheet_id, "Worksheet added");
        Ok(properties.into())
    }

    async fn write_values(&self, worksheet: &str, ranges: Vec<ValueRange>) -> SheetsResult<()> {
        let data: Vec<Value> = ranges
            .into_iter()
            .map(|r| {
                json!({
                    "range": quoted_range(worksheet, Some(&r.range)),
                    "values": r.values,
                })
            })
            .collect();
        let url = self.spreadsheet_url("/values:batchUpdate");
        self.post(&url, &json!({ "valueInputOption": "RAW", "data": data }))
            .await?;
        Ok(())
    }

    async fn format_header(&self, sheet_id: i64, columns: usize) -> SheetsResult<()> {
        self.batch_update(vec![
            json!({
                "repeatCell": {
                    "range": {
                        "sheetId": sheet_id,
                        "startRowIndex": 0,
                        "endRowIndex": 1,
                        "startColumnIndex": 0,
                        "endColumnIndex": columns
                    },
                    "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                    "fields": "userEnteredFormat.textFormat.bold"
                }
            }),
            json!({
                "updateSheetProperties": {
                    "properties": { "sheetId": sheet_id, "gridProperties": { "frozenRowCount": 1 } },
                    "fields": "gridProperties.frozenRowCount"
                }
            }),
        ])
        .await?;
        Ok(())
    }

    async fn move_worksheet(&self, sheet_id: i64, index: usize) -> SheetsResult<()> {
        self.batch_update(vec![json!({
            "updateSheetProperties": {
                "properties": { "sheetId": sheet_id, "index": index },
                "fields": "index"
            }
        })])
        .await?;
        Ok(())
    }

    async fn delete_worksheet(&self, sheet_id: i64) -> SheetsResult<()> {
        self.batch_update(vec![json!({ "deleteSheet": { "sheetId": sheet_id } })])
            .await?;
        Ok(())
    }

    async fn read_values(&self, worksheet: &str) -> SheetsResult<Vec<Vec<String>>> {
        let mut url = Url::parse(&self.spreadsheet_url("/values"))
            .map_err(|e| SheetsError::Parse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Parse("spreadsheet url cannot take a path".to_string()))?
            .push(&quoted_range(worksheet, None));

        let response = self
            .http
            .get(url)
            .bearer_auth(self.tokens.access_token().await?)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SheetsError::NotFound(format!("worksheet '{}'", worksheet)));
        }
        let values: ValuesResponse = parse_json(response).await?;
        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}
