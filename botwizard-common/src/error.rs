// ================================================================
// File: botwizard-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    // OAuth token lifecycle. AuthExchange covers a bad/expired/reused
    // authorization code; NoCredential means the project never consented;
    // Refresh is terminal and means the caller must re-run consent.
    #[error("Authorization code exchange failed: {0}")]
    AuthExchange(String),

    #[error("No stored credential for project: {0}")]
    NoCredential(String),

    #[error("Token refresh failed (reauthorization required): {0}")]
    Refresh(String),

    // Spreadsheet synchronization.
    #[error("Spreadsheet provisioning failed: {0}")]
    Provision(String),

    #[error("Access denied to spreadsheet: {0}")]
    AccessDenied(String),

    #[error("Transient remote error: {0}")]
    TransientRemote(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Sheet validation error: {0}")]
    SheetValidation(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Uuid error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// True for error kinds the sheets client may retry with backoff.
    /// Authorization and validation failures are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransientRemote(_) | Error::Timeout(_))
    }
}
