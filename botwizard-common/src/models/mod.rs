// File: botwizard-common/src/models/mod.rs
pub mod project;
pub mod credential;
pub mod sheet;
pub mod message;
pub mod analytics;

pub use project::Project;
pub use credential::GoogleCredential;
pub use sheet::{SpreadsheetBinding, SpreadsheetInfo, SheetProperties};
pub use message::{MessageLogEntry, Channel, FaqEntry};
