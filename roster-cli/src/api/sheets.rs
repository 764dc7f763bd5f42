//! Google Sheets client
//!
//! Opens a spreadsheet by name through the Drive API, then exposes a single
//! worksheet as a [`TabularStore`] through the Sheets v4 values and
//! batchUpdate endpoints. Requests are sent once; there are no retries.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{Result, RosterError};
use crate::store::{DEFAULT_HEADERS, TabularStore, trim_trailing_empty};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Size of a newly created worksheet
const NEW_SHEET_ROWS: usize = 1000;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// A spreadsheet file found on Drive
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    access_token: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Send a request and decode its JSON body. Non-success statuses become
    /// [`RosterError::Api`].
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    /// Find a spreadsheet the user can access by its exact name
    pub async fn open_by_name(&self, name: &str) -> Result<Spreadsheet> {
        let query = drive_query(name);
        let request = self.request(Method::GET, DRIVE_FILES_API).query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("pageSize", "1"),
            ("includeItemsFromAllDrives", "true"),
            ("supportsAllDrives", "true"),
        ]);

        let list: FileList = self.send(request).await?;
        let file = list
            .files
            .into_iter()
            .next()
            .ok_or_else(|| RosterError::SpreadsheetNotFound(name.to_string()))?;

        info!("Opened spreadsheet '{}' ({})", file.name, file.id);
        Ok(Spreadsheet {
            id: file.id,
            name: file.name,
        })
    }

    /// Open the worksheet with the given title, creating it with the default
    /// header row when it does not exist
    pub async fn worksheet(&self, spreadsheet: &Spreadsheet, title: &str) -> Result<Worksheet> {
        let url = format!("{}/{}", SHEETS_API, spreadsheet.id);
        let request = self
            .request(Method::GET, &url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let meta: SpreadsheetMeta = self.send(request).await?;

        if let Some(entry) = meta.sheets.into_iter().find(|s| s.properties.title == title) {
            return Ok(Worksheet {
                client: self.clone(),
                spreadsheet_id: spreadsheet.id.clone(),
                sheet_id: entry.properties.sheet_id,
                title: entry.properties.title,
            });
        }

        info!("Worksheet '{}' not found, creating it", title);
        let sheet_id = self.add_sheet(&spreadsheet.id, title).await?;
        let worksheet = Worksheet {
            client: self.clone(),
            spreadsheet_id: spreadsheet.id.clone(),
            sheet_id,
            title: title.to_string(),
        };
        worksheet.write_header(&DEFAULT_HEADERS).await?;

        Ok(worksheet)
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<i64> {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": DEFAULT_HEADERS.len(),
                        }
                    }
                }
            }]
        });
        let reply: Value = self.batch_update(spreadsheet_id, body).await?;

        reply["replies"][0]["addSheet"]["properties"]["sheetId"]
            .as_i64()
            .ok_or_else(|| RosterError::Api {
                status: 200,
                message: "addSheet reply carried no sheetId".to_string(),
            })
    }

    async fn batch_update(&self, spreadsheet_id: &str, body: Value) -> Result<Value> {
        let url = format!("{}/{}:batchUpdate", SHEETS_API, spreadsheet_id);
        self.send(self.request(Method::POST, &url).json(&body)).await
    }
}

/// One worksheet of an opened spreadsheet
#[derive(Debug, Clone)]
pub struct Worksheet {
    client: SheetsClient,
    spreadsheet_id: String,
    sheet_id: i64,
    title: String,
}

impl Worksheet {
    pub fn title(&self) -> &str {
        &self.title
    }

    fn values_url(&self, range: &str) -> String {
        values_url(&self.spreadsheet_id, range)
    }

    async fn get_values(&self, range: &str, by_columns: bool) -> Result<Vec<Vec<String>>> {
        let mut request = self.client.request(Method::GET, &self.values_url(range));
        if by_columns {
            request = request.query(&[("majorDimension", "COLUMNS")]);
        }
        let range: ValueRange = self.client.send(request).await?;
        Ok(range.values)
    }

    async fn write_header(&self, headers: &[&str]) -> Result<()> {
        let range = format!("{}!A1", quote_sheet(&self.title));
        let request = self
            .client
            .request(Method::PUT, &self.values_url(&range))
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": [headers] }));
        let _: Value = self.client.send(request).await?;
        Ok(())
    }

    async fn append(&self, rows: Vec<Vec<String>>) -> Result<()> {
        let url = format!("{}:append", self.values_url(&quote_sheet(&self.title)));
        let request = self
            .client
            .request(Method::POST, &url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": rows }));
        let _: Value = self.client.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl TabularStore for Worksheet {
    async fn col_values(&self, col: usize) -> Result<Vec<String>> {
        let letter = column_letter(col);
        let range = format!("{}!{}:{}", quote_sheet(&self.title), letter, letter);
        let columns = self.get_values(&range, true).await?;
        Ok(trim_trailing_empty(columns.into_iter().next().unwrap_or_default()))
    }

    async fn row_values(&self, row: usize) -> Result<Vec<String>> {
        let range = format!("{}!{}:{}", quote_sheet(&self.title), row, row);
        let rows = self.get_values(&range, false).await?;
        Ok(trim_trailing_empty(rows.into_iter().next().unwrap_or_default()))
    }

    async fn all_values(&self) -> Result<Vec<Vec<String>>> {
        self.get_values(&quote_sheet(&self.title), false).await
    }

    async fn append_row(&self, row: Vec<String>) -> Result<()> {
        self.append(vec![row]).await
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        self.append(rows).await
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<()> {
        let range = a1_cell(&self.title, row, col);
        let request = self
            .client
            .request(Method::PUT, &self.values_url(&range))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": [[value]] }));
        let _: Value = self.client.send(request).await?;
        Ok(())
    }

    async fn delete_row(&self, row: usize) -> Result<()> {
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": self.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        });
        self.client.batch_update(&self.spreadsheet_id, body).await?;
        Ok(())
    }
}

/// Convert a 1-based column number to its letter form (1 -> A, 27 -> AA)
pub fn column_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a sheet title for use in an A1 range
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// A1 reference to a single cell, e.g. `'Sheet1'!D3`
pub fn a1_cell(title: &str, row: usize, col: usize) -> String {
    format!("{}!{}{}", quote_sheet(title), column_letter(col), row)
}

fn values_url(spreadsheet_id: &str, range: &str) -> String {
    format!(
        "{}/{}/values/{}",
        SHEETS_API,
        spreadsheet_id,
        urlencoding::encode(range)
    )
}

/// Drive search expression matching a spreadsheet by exact name
fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

/// Build an API error from a Google error body, falling back to the raw text
fn api_error(status: u16, body: &str) -> RosterError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    RosterError::Api { status, message }
}
