// botwizard-core/src/sheets/api.rs
//
// One trait method per Google Sheets v4 / Drive v3 call we make. The
// reqwest implementation is stateless: each call carries its own bearer
// token, so nothing mutable is ever shared across tenants.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::Error;
use botwizard_common::models::{SheetProperties, SpreadsheetInfo};

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_BASE: &str = "https://www.googleapis.com/drive/v3/files";

/// Bounded per-request timeout; exceeding it is a transient failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Create an empty spreadsheet; returns its id.
    async fn create_spreadsheet(&self, token: &str, title: &str) -> Result<String, Error>;

    /// Raw `spreadsheets.batchUpdate` with the given request list.
    async fn batch_update(
        &self,
        token: &str,
        spreadsheet_id: &str,
        requests: Value,
    ) -> Result<(), Error>;

    /// `values.update` with RAW input, overwriting the range.
    async fn update_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), Error>;

    /// `values.append` with RAW input.
    async fn append_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), Error>;

    /// `values.get`; an absent `values` field means no data.
    async fn get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, Error>;

    /// `spreadsheets.get` restricted to title and sheet properties.
    async fn get_spreadsheet(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, Error>;

    /// Drive `permissions.create` granting writer access to an identity.
    async fn create_permission(
        &self,
        token: &str,
        file_id: &str,
        email: &str,
    ) -> Result<(), Error>;
}

/// How a non-success status from Google maps onto our error taxonomy.
/// 429 and 5xx are transient and eligible for retry; 401 means the bearer
/// token is no longer accepted; 403 is a permission problem; 400 is a
/// permanent request defect (bad range / unknown sheet).
fn classify_status(
    status: StatusCode,
    body: String,
    on_bad_request: fn(String) -> Error,
) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            Error::TransientRemote(format!("rate limited ({status}): {body}"))
        }
        s if s.is_server_error() => {
            Error::TransientRemote(format!("server error ({status}): {body}"))
        }
        StatusCode::UNAUTHORIZED => Error::Auth(format!("bearer token rejected: {body}")),
        StatusCode::FORBIDDEN => Error::AccessDenied(body),
        StatusCode::BAD_REQUEST => on_bad_request(body),
        s => Error::Parse(format!("unexpected status {s} from Google: {body}")),
    }
}

fn map_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::TransientRemote(format!("request timed out: {e}"))
    } else {
        Error::Http(e)
    }
}

pub struct HttpSheetsApi;

impl HttpSheetsApi {
    pub fn new() -> Self {
        Self
    }

    fn client(&self) -> Result<ReqwestClient, Error> {
        ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)
    }

    async fn check_response(
        resp: reqwest::Response,
        on_bad_request: fn(String) -> Error,
    ) -> Result<reqwest::Response, Error> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status, body, on_bad_request))
    }
}

impl Default for HttpSheetsApi {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct CreateSpreadsheetResponse {
    #[serde(rename = "spreadsheetId")]
    spreadsheet_id: String,
}

#[derive(Deserialize)]
struct ValuesGetResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct SpreadsheetGetResponse {
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetEntryProperties,
}

#[derive(Deserialize)]
struct SheetEntryProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[async_trait]
impl SheetsApi for HttpSheetsApi {
    async fn create_spreadsheet(&self, token: &str, title: &str) -> Result<String, Error> {
        let resp = self
            .client()?
            .post(SHEETS_BASE)
            .bearer_auth(token)
            .json(&json!({ "properties": { "title": title } }))
            .send()
            .await
            .map_err(map_send_error)?;

        let resp = Self::check_response(resp, Error::Provision).await?;
        let parsed = resp.json::<CreateSpreadsheetResponse>().await?;
        debug!("Created spreadsheet {}", parsed.spreadsheet_id);
        Ok(parsed.spreadsheet_id)
    }

    async fn batch_update(
        &self,
        token: &str,
        spreadsheet_id: &str,
        requests: Value,
    ) -> Result<(), Error> {
        let url = format!("{SHEETS_BASE}/{spreadsheet_id}:batchUpdate");
        let resp = self
            .client()?
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(map_send_error)?;

        Self::check_response(resp, Error::Provision).await?;
        Ok(())
    }

    async fn update_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), Error> {
        let url = format!(
            "{SHEETS_BASE}/{spreadsheet_id}/values/{}?valueInputOption=RAW",
            urlencoding::encode(range)
        );
        let resp = self
            .client()?
            .put(&url)
            .bearer_auth(token)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(map_send_error)?;

        Self::check_response(resp, Error::SheetValidation).await?;
        Ok(())
    }

    async fn append_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), Error> {
        let url = format!(
            "{SHEETS_BASE}/{spreadsheet_id}/values/{}:append?valueInputOption=RAW",
            urlencoding::encode(range)
        );
        let resp = self
            .client()?
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(map_send_error)?;

        Self::check_response(resp, Error::SheetValidation).await?;
        Ok(())
    }

    async fn get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, Error> {
        let url = format!(
            "{SHEETS_BASE}/{spreadsheet_id}/values/{}",
            urlencoding::encode(range)
        );
        let resp = self
            .client()?
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_send_error)?;

        let resp = Self::check_response(resp, Error::Read).await?;
        let parsed = resp.json::<ValuesGetResponse>().await?;
        Ok(parsed.values)
    }

    async fn get_spreadsheet(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, Error> {
        let url = format!(
            "{SHEETS_BASE}/{spreadsheet_id}?fields=properties.title,sheets.properties"
        );
        let resp = self
            .client()?
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_send_error)?;

        let resp = Self::check_response(resp, Error::Read).await?;
        let parsed = resp.json::<SpreadsheetGetResponse>().await?;
        Ok(SpreadsheetInfo {
            title: parsed.properties.title,
            sheets: parsed
                .sheets
                .into_iter()
                .map(|s| SheetProperties {
                    id: s.properties.sheet_id,
                    title: s.properties.title,
                })
                .collect(),
        })
    }

    async fn create_permission(
        &self,
        token: &str,
        file_id: &str,
        email: &str,
    ) -> Result<(), Error> {
        let url = format!("{DRIVE_BASE}/{file_id}/permissions");
        let resp = self
            .client()?
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "role": "writer",
                "type": "user",
                "emailAddress": email,
            }))
            .send()
            .await
            .map_err(map_send_error)?;

        Self::check_response(resp, Error::Provision).await?;
        Ok(())
    }
}
