use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The durable association between a project and one remote Google
/// spreadsheet. Created once; re-binding replaces it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpreadsheetBinding {
    pub project_id: Uuid,
    pub spreadsheet_id: String,
    pub url: String,
}

impl SpreadsheetBinding {
    pub fn new(project_id: Uuid, spreadsheet_id: impl Into<String>) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        let url = canonical_url(&spreadsheet_id);
        Self { project_id, spreadsheet_id, url }
    }
}

pub fn canonical_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit", spreadsheet_id)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SheetProperties {
    pub id: i64,
    pub title: String,
}

/// Title plus sheet inventory, as returned by `SheetSyncClient::get_info`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub sheets: Vec<SheetProperties>,
}

impl SpreadsheetInfo {
    pub fn sheet_titles(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.title.clone()).collect()
    }
}
