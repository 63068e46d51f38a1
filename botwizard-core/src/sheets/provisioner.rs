// botwizard-core/src/sheets/provisioner.rs
//
// Creates or binds the remote spreadsheet for a project. A new document
// gets the canonical six-sheet schema; an existing one is bound as-is
// after an access check. Partway failures surface as Error::Provision and
// leave no local binding; remote leftovers cannot be rolled back against
// an external system and are tolerated.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Error;
use crate::sheets::client::SheetSyncClient;
use crate::sheets::schema;
use botwizard_common::models::{GoogleCredential, SpreadsheetBinding};

pub struct SpreadsheetProvisioner {
    client: Arc<SheetSyncClient>,
    /// Service identity granted writer access on every new document.
    service_account_email: Option<String>,
}

impl SpreadsheetProvisioner {
    pub fn new(client: Arc<SheetSyncClient>, service_account_email: Option<String>) -> Self {
        Self {
            client,
            service_account_email,
        }
    }

    fn document_title(project_title: &str) -> String {
        format!("{project_title} - Telegram Bot Data")
    }

    /// Create a new document with the canonical schema. Returns the
    /// binding; the caller persists it only when this succeeds.
    pub async fn provision(
        &self,
        project_id: Uuid,
        project_title: &str,
        credential: &GoogleCredential,
    ) -> Result<SpreadsheetBinding, Error> {
        let title = Self::document_title(project_title);
        let spreadsheet_id = self
            .client
            .create_spreadsheet(credential, &title)
            .await
            .map_err(|e| Error::Provision(format!("document creation failed: {e}")))?;

        self.create_schema_sheets(credential, &spreadsheet_id)
            .await
            .map_err(|e| Error::Provision(format!("sheet restructuring failed: {e}")))?;

        self.write_headers(credential, &spreadsheet_id)
            .await
            .map_err(|e| Error::Provision(format!("header write failed: {e}")))?;

        // Sharing with the bot's service identity is best-effort: the
        // owner credential can still use the document without it.
        if let Some(email) = &self.service_account_email {
            if let Err(e) = self
                .client
                .create_permission(credential, &spreadsheet_id, email)
                .await
            {
                warn!(
                    "Could not share spreadsheet {} with {}: {}",
                    spreadsheet_id, email, e
                );
            }
        }

        info!(
            "Provisioned spreadsheet {} for project {}",
            spreadsheet_id, project_id
        );
        Ok(SpreadsheetBinding::new(project_id, spreadsheet_id))
    }

    /// Bind an existing document after verifying read access. The binding
    /// stores only id and URL; existing documents keep their own layout.
    pub async fn connect_existing(
        &self,
        project_id: Uuid,
        spreadsheet_id: &str,
        credential: &GoogleCredential,
    ) -> Result<SpreadsheetBinding, Error> {
        // A transient outage that outlives the retry budget is not a
        // permission problem; only non-transient failures become
        // AccessDenied.
        self.client
            .get_spreadsheet(credential, spreadsheet_id)
            .await
            .map_err(|e| {
                if e.is_transient() {
                    e
                } else {
                    Error::AccessDenied(format!(
                        "cannot read spreadsheet {spreadsheet_id}: {e}"
                    ))
                }
            })?;

        info!(
            "Connected existing spreadsheet {} to project {}",
            spreadsheet_id, project_id
        );
        Ok(SpreadsheetBinding::new(project_id, spreadsheet_id))
    }

    /// Add the six named sheets, then drop the default sheet so the
    /// document contains exactly the canonical set. Adding first keeps
    /// the document valid throughout (a spreadsheet must always hold at
    /// least one sheet).
    async fn create_schema_sheets(
        &self,
        credential: &GoogleCredential,
        spreadsheet_id: &str,
    ) -> Result<(), Error> {
        let add_requests: Vec<_> = schema::SHEET_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                json!({
                    "addSheet": {
                        "properties": {
                            "sheetId": index as i64 + 1,
                            "title": name,
                            "gridProperties": {
                                "rowCount": 1000,
                                "columnCount": 20
                            }
                        }
                    }
                })
            })
            .collect();

        self.client
            .batch_update(credential, spreadsheet_id, json!(add_requests))
            .await?;

        self.client
            .batch_update(
                credential,
                spreadsheet_id,
                json!([{ "deleteSheet": { "sheetId": 0 } }]),
            )
            .await
    }

    async fn write_headers(
        &self,
        credential: &GoogleCredential,
        spreadsheet_id: &str,
    ) -> Result<(), Error> {
        for sheet_name in schema::SHEET_NAMES {
            let (Some(headers), Some(range)) = (
                schema::headers_for(sheet_name),
                schema::header_range(sheet_name),
            ) else {
                continue;
            };
            let row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

            self.client
                .update_values(credential, spreadsheet_id, &range, vec![row])
                .await?;
        }
        Ok(())
    }
}
