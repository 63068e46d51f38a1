// botwizard-core/src/sheets/service.rs
//
// Project-facing operations over the bound spreadsheet: the boundary
// layer (HTTP routes, bot runtime) calls these with a project id and gets
// back serializable result shapes. Credentials are resolved per call
// through the auth manager, never cached here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::Error;
use crate::auth::GoogleAuthManager;
use crate::sheets::client::SheetSyncClient;
use crate::sheets::provisioner::SpreadsheetProvisioner;
use botwizard_common::models::{SheetProperties, SpreadsheetBinding};
use botwizard_common::traits::repository_traits::SheetBindingRepository;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResult {
    pub spreadsheet_id: String,
    pub url: String,
    pub sheets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    pub spreadsheet_id: String,
    pub url: String,
    pub title: String,
    pub sheets: Vec<SheetProperties>,
}

pub struct SheetService {
    auth: Arc<GoogleAuthManager>,
    client: Arc<SheetSyncClient>,
    provisioner: SpreadsheetProvisioner,
    bindings: Arc<dyn SheetBindingRepository>,
}

impl SheetService {
    pub fn new(
        auth: Arc<GoogleAuthManager>,
        client: Arc<SheetSyncClient>,
        provisioner: SpreadsheetProvisioner,
        bindings: Arc<dyn SheetBindingRepository>,
    ) -> Self {
        Self {
            auth,
            client,
            provisioner,
            bindings,
        }
    }

    async fn binding_for(&self, project_id: Uuid) -> Result<SpreadsheetBinding, Error> {
        self.bindings.get_binding(project_id).await?.ok_or_else(|| {
            Error::NotFound(format!("no spreadsheet connected to project {project_id}"))
        })
    }

    /// Create the canonical document and persist the binding. The binding
    /// is stored only after provisioning fully succeeds; a partway remote
    /// failure leaves no local state behind.
    pub async fn provision_sheet(
        &self,
        project_id: Uuid,
        project_title: &str,
    ) -> Result<ProvisionResult, Error> {
        let credential = self.auth.get_valid_credential(project_id).await?;
        let binding = self
            .provisioner
            .provision(project_id, project_title, &credential)
            .await?;

        self.bindings.store_binding(&binding).await?;
        info!("Bound spreadsheet {} to project {}", binding.spreadsheet_id, project_id);

        Ok(ProvisionResult {
            spreadsheet_id: binding.spreadsheet_id,
            url: binding.url,
            sheets: crate::sheets::schema::SHEET_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
    }

    /// Bind an existing document after an access check; returns its title
    /// and sheet inventory.
    pub async fn connect_sheet(
        &self,
        project_id: Uuid,
        spreadsheet_id: &str,
    ) -> Result<ConnectResult, Error> {
        let credential = self.auth.get_valid_credential(project_id).await?;
        let binding = self
            .provisioner
            .connect_existing(project_id, spreadsheet_id, &credential)
            .await?;

        let info = self.client.get_info(&binding, &credential).await?;
        self.bindings.store_binding(&binding).await?;

        Ok(ConnectResult {
            spreadsheet_id: binding.spreadsheet_id,
            url: binding.url,
            title: info.title,
            sheets: info.sheets,
        })
    }

    /// Append one business-event row to the named sheet of the project's
    /// document. A bearer rejection triggers one refresh-and-retry; a
    /// failed refresh propagates as "reauthorization required".
    pub async fn append_row(
        &self,
        project_id: Uuid,
        sheet_name: &str,
        values: &[String],
    ) -> Result<(), Error> {
        let binding = self.binding_for(project_id).await?;
        let credential = self.auth.get_valid_credential(project_id).await?;

        match self
            .client
            .append_row(&binding, &credential, sheet_name, values)
            .await
        {
            Err(Error::Auth(_)) => {
                // The token expired between the validity check and the
                // remote call. Refresh once; give up if that fails too.
                let credential = self.auth.refresh(project_id).await?;
                self.client
                    .append_row(&binding, &credential, sheet_name, values)
                    .await
            }
            other => other,
        }
    }

    /// Rows from the project's document; defaults to the whole sheet when
    /// no explicit range is given.
    pub async fn read_range(
        &self,
        project_id: Uuid,
        sheet_name: &str,
        range: Option<&str>,
    ) -> Result<Vec<Vec<String>>, Error> {
        let binding = self.binding_for(project_id).await?;
        let credential = self.auth.get_valid_credential(project_id).await?;

        let full_range = match range {
            Some(r) => r.to_string(),
            None => format!("{sheet_name}!A1:Z1000"),
        };
        self.client
            .read_range(&binding, &credential, &full_range)
            .await
    }

    /// Title and sheet inventory of the bound document.
    pub async fn sheet_info(
        &self,
        project_id: Uuid,
    ) -> Result<botwizard_common::models::SpreadsheetInfo, Error> {
        let binding = self.binding_for(project_id).await?;
        let credential = self.auth.get_valid_credential(project_id).await?;
        self.client.get_info(&binding, &credential).await
    }
}
