// botwizard-core/src/auth/google.rs
//
// Raw HTTP client for the Google OAuth token endpoint. Code exchange and
// refresh are the only two operations; everything else (consent URL,
// persistence, single-flight) lives in the manager.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::debug;

use crate::Error;
use crate::config::GoogleConfig;
use botwizard_common::models::GoogleCredential;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Matches Google's JSON from the token endpoint.
#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
    #[allow(dead_code)]
    scope: Option<String>,
    #[allow(dead_code)]
    token_type: String, // e.g. "Bearer"
}

impl GoogleTokenResponse {
    fn into_credential(self) -> GoogleCredential {
        let expires_at = Utc::now() + Duration::seconds(self.expires_in as i64);
        GoogleCredential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Some(expires_at),
        }
    }
}

/// The remote half of the token lifecycle, kept behind a trait so tests
/// can exercise the manager without real network requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Exchange an authorization code for a credential. The result is not
    /// persisted here; callers decide what to store.
    async fn exchange_code(&self, code: &str) -> Result<GoogleCredential, Error>;

    /// Obtain a fresh access token from a refresh token. Google does not
    /// re-issue the refresh token on this path, so the returned
    /// credential carries `refresh_token: None`.
    async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleCredential, Error>;
}

pub struct GoogleOAuthClient {
    config: GoogleConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<GoogleCredential, Error> {
        let http_client = ReqwestClient::new();

        let params = [
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
            ("code", code.to_string()),
            ("grant_type", "authorization_code".to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
        ];

        let resp = http_client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::AuthExchange(format!("HTTP error exchanging code: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::AuthExchange(format!(
                "Google token endpoint rejected code ({status}): {body}"
            )));
        }

        let parsed = resp
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| Error::AuthExchange(format!("Parse error on token JSON: {e}")))?;

        debug!("Exchanged authorization code for Google credential");
        Ok(parsed.into_credential())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleCredential, Error> {
        let http_client = ReqwestClient::new();

        let params = [
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let resp = http_client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Refresh(format!("HTTP error refreshing token: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Refresh(format!(
                "Google token endpoint rejected refresh ({status}): {body}"
            )));
        }

        let parsed = resp
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| Error::Refresh(format!("Parse error on refresh JSON: {e}")))?;

        Ok(parsed.into_credential())
    }
}
