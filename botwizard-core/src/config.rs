// botwizard-core/src/config.rs

use crate::Error;

/// Google OAuth application settings, read from the environment the same
/// way the rest of the deployment is configured.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Service identity granted writer access on provisioned documents.
    pub service_account_email: Option<String>,
}

impl GoogleConfig {
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| Error::Parse("GOOGLE_CLIENT_ID not set".into()))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| Error::Parse("GOOGLE_CLIENT_SECRET not set".into()))?;
        let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
            .map_err(|_| Error::Parse("GOOGLE_REDIRECT_URI not set".into()))?;
        let service_account_email = std::env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL").ok();

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            service_account_email,
        })
    }
}
