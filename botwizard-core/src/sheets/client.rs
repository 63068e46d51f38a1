// botwizard-core/src/sheets/client.rs
//
// Retrying wrapper around the Sheets/Drive API. Transient failures (rate
// limiting, 5xx, timeouts) are retried with exponential backoff up to a
// bounded attempt count; authorization and validation failures propagate
// immediately. Appends to the same (project, sheet) pair are serialized
// so row order in the remote document matches event order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Error;
use crate::sheets::api::SheetsApi;
use crate::sheets::schema;
use botwizard_common::models::{GoogleCredential, SpreadsheetBinding, SpreadsheetInfo};
use serde_json::Value;

const MAX_RETRIES: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(250);

pub struct SheetSyncClient {
    api: Arc<dyn SheetsApi>,
    /// One mutex per (project, sheet) pair; cross-project appends run in
    /// parallel.
    append_locks: DashMap<(Uuid, String), Arc<Mutex<()>>>,
}

impl SheetSyncClient {
    pub fn new(api: Arc<dyn SheetsApi>) -> Self {
        Self {
            api,
            append_locks: DashMap::new(),
        }
    }

    async fn with_retries<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut delay = BASE_DELAY;
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(
                        "{op}: transient remote error (attempt {attempt}/{MAX_RETRIES}), \
                         retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Append one ordered tuple as the next row of the named sheet.
    ///
    /// Unknown sheet names fail with `Error::SheetValidation` before any
    /// remote call and are never retried.
    pub async fn append_row(
        &self,
        binding: &SpreadsheetBinding,
        credential: &GoogleCredential,
        sheet_name: &str,
        values: &[String],
    ) -> Result<(), Error> {
        if !schema::is_known_sheet(sheet_name) {
            return Err(Error::SheetValidation(format!(
                "unknown sheet name: {sheet_name}"
            )));
        }

        let key = (binding.project_id, sheet_name.to_string());
        let lock = self
            .append_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // Held across the remote call (including retries): releasing it
        // earlier would let a later event land before an earlier one that
        // is still backing off.
        let _guard = lock.lock().await;

        let range = format!("{sheet_name}!A:Z");
        let row = vec![values.to_vec()];
        self.with_retries("append_row", || {
            self.api.append_values(
                &credential.access_token,
                &binding.spreadsheet_id,
                &range,
                row.clone(),
            )
        })
        .await?;

        debug!(
            "Appended row to {} of spreadsheet {}",
            sheet_name, binding.spreadsheet_id
        );
        Ok(())
    }

    /// Rows in the given A1-notation range; empty when the range holds no
    /// data.
    pub async fn read_range(
        &self,
        binding: &SpreadsheetBinding,
        credential: &GoogleCredential,
        range: &str,
    ) -> Result<Vec<Vec<String>>, Error> {
        self.with_retries("read_range", || {
            self.api
                .get_values(&credential.access_token, &binding.spreadsheet_id, range)
        })
        .await
    }

    /// Whether the credential can read the document's properties. Never
    /// errors; any remote failure counts as "no access".
    pub async fn check_access(
        &self,
        binding: &SpreadsheetBinding,
        credential: &GoogleCredential,
    ) -> bool {
        self.api
            .get_spreadsheet(&credential.access_token, &binding.spreadsheet_id)
            .await
            .is_ok()
    }

    /// Title and sheet inventory of the bound document.
    pub async fn get_info(
        &self,
        binding: &SpreadsheetBinding,
        credential: &GoogleCredential,
    ) -> Result<SpreadsheetInfo, Error> {
        self.with_retries("get_info", || {
            self.api
                .get_spreadsheet(&credential.access_token, &binding.spreadsheet_id)
        })
        .await
    }

    // Lower-level passthroughs used by the provisioner; same retry policy.

    pub(crate) async fn create_spreadsheet(
        &self,
        credential: &GoogleCredential,
        title: &str,
    ) -> Result<String, Error> {
        self.with_retries("create_spreadsheet", || {
            self.api.create_spreadsheet(&credential.access_token, title)
        })
        .await
    }

    pub(crate) async fn batch_update(
        &self,
        credential: &GoogleCredential,
        spreadsheet_id: &str,
        requests: Value,
    ) -> Result<(), Error> {
        self.with_retries("batch_update", || {
            self.api.batch_update(
                &credential.access_token,
                spreadsheet_id,
                requests.clone(),
            )
        })
        .await
    }

    pub(crate) async fn update_values(
        &self,
        credential: &GoogleCredential,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), Error> {
        self.with_retries("update_values", || {
            self.api.update_values(
                &credential.access_token,
                spreadsheet_id,
                range,
                values.clone(),
            )
        })
        .await
    }

    pub(crate) async fn create_permission(
        &self,
        credential: &GoogleCredential,
        file_id: &str,
        email: &str,
    ) -> Result<(), Error> {
        self.with_retries("create_permission", || {
            self.api
                .create_permission(&credential.access_token, file_id, email)
        })
        .await
    }

    pub(crate) async fn get_spreadsheet(
        &self,
        credential: &GoogleCredential,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, Error> {
        self.with_retries("get_spreadsheet", || {
            self.api
                .get_spreadsheet(&credential.access_token, spreadsheet_id)
        })
        .await
    }
}
