// botwizard-core/src/sheets/mod.rs

pub mod schema;
pub mod api;
pub mod client;
pub mod provisioner;
pub mod service;

pub use api::{HttpSheetsApi, SheetsApi};
pub use client::SheetSyncClient;
pub use provisioner::SpreadsheetProvisioner;
pub use service::SheetService;
