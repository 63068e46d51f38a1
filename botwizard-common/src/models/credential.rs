use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The delegated Google credential state stored per project.
///
/// One record per project; overwritten on every refresh, never deleted
/// while the project exists.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GoogleCredential {
    pub access_token: String,
    /// Absent when Google did not issue one (should not happen with
    /// `prompt=consent`, but existing records may predate that).
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl GoogleCredential {
    /// Whether the access token expires within `margin` of now. A record
    /// with no recorded expiry is treated as expiring (we cannot prove it
    /// is still valid).
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(at) => at - Utc::now() <= margin,
            None => true,
        }
    }
}
