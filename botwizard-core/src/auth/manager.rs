// botwizard-core/src/auth/manager.rs
//
// Owns the delegated-credential lifecycle for every project: consent URL,
// code exchange, persistence, and ahead-of-expiry refresh. Refresh is
// single-flight per project so concurrent requests never issue duplicate
// refresh calls or overwrite fresh tokens with stale ones.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Error;
use crate::auth::google::OAuthClient;
use crate::config::GoogleConfig;
use botwizard_common::models::GoogleCredential;
use botwizard_common::traits::repository_traits::GoogleTokenRepository;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/calendar.readonly",
];

/// Refresh when the access token expires within this margin of now.
const REFRESH_MARGIN_SECS: i64 = 60;

pub struct GoogleAuthManager {
    token_repo: Arc<dyn GoogleTokenRepository>,
    oauth: Arc<dyn OAuthClient>,
    config: GoogleConfig,

    /// One mutex per project guarding the read-check-refresh-write
    /// sequence.
    refresh_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl GoogleAuthManager {
    pub fn new(
        token_repo: Arc<dyn GoogleTokenRepository>,
        oauth: Arc<dyn OAuthClient>,
        config: GoogleConfig,
    ) -> Self {
        Self {
            token_repo,
            oauth,
            config,
            refresh_locks: DashMap::new(),
        }
    }

    /// The Google consent URL. Deterministic for a given config and state:
    /// offline access with forced re-consent so a refresh token is issued
    /// even on repeat authorizations.
    pub fn build_consent_url(&self, state: Option<&str>) -> String {
        let scope_str = SCOPES.join(" ");
        let mut url = format!(
            "{base}?response_type=code&client_id={cid}\
             &redirect_uri={redir}&scope={scope}\
             &access_type=offline&prompt=consent",
            base = AUTH_URL,
            cid = urlencoding::encode(&self.config.client_id),
            redir = urlencoding::encode(&self.config.redirect_uri),
            scope = urlencoding::encode(&scope_str),
        );
        if let Some(st) = state {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(st));
        }
        url
    }

    /// Exchange an authorization code. No persistence side effect; use
    /// [`complete_authorization`](Self::complete_authorization) to also
    /// store the result under a project.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleCredential, Error> {
        self.oauth.exchange_code(code).await
    }

    /// Exchange a code and persist the resulting record for the project,
    /// overwriting any previous consent.
    pub async fn complete_authorization(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<GoogleCredential, Error> {
        let credential = self.oauth.exchange_code(code).await?;
        self.token_repo
            .store_token_record(project_id, &credential)
            .await?;
        info!("Stored Google credential for project {}", project_id);
        Ok(credential)
    }

    /// The stored record, without triggering a refresh.
    pub async fn stored_credential(
        &self,
        project_id: Uuid,
    ) -> Result<Option<GoogleCredential>, Error> {
        self.token_repo.get_token_record(project_id).await
    }

    /// Returns a credential whose access token is valid for at least the
    /// refresh margin, refreshing and persisting first when needed.
    ///
    /// Fails with `Error::NoCredential` when the project never consented
    /// and `Error::Refresh` when the refresh token is absent or rejected;
    /// the latter is terminal and means reauthorization is required.
    pub async fn get_valid_credential(&self, project_id: Uuid) -> Result<GoogleCredential, Error> {
        let margin = Duration::seconds(REFRESH_MARGIN_SECS);

        // Fast path, no lock: record exists and is not close to expiry.
        let record = self
            .token_repo
            .get_token_record(project_id)
            .await?
            .ok_or_else(|| Error::NoCredential(project_id.to_string()))?;

        if !record.expires_within(margin) {
            return Ok(record);
        }

        let lock = self
            .refresh_locks
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent caller may have refreshed
        // while we were waiting, in which case its result is ours too.
        let record = self
            .token_repo
            .get_token_record(project_id)
            .await?
            .ok_or_else(|| Error::NoCredential(project_id.to_string()))?;

        if !record.expires_within(margin) {
            return Ok(record);
        }

        self.refresh_locked(project_id, record).await
    }

    /// Force a refresh regardless of current expiry (the explicit refresh
    /// entry point exposed to the boundary layer).
    pub async fn refresh(&self, project_id: Uuid) -> Result<GoogleCredential, Error> {
        let lock = self
            .refresh_locks
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let record = self
            .token_repo
            .get_token_record(project_id)
            .await?
            .ok_or_else(|| Error::NoCredential(project_id.to_string()))?;

        self.refresh_locked(project_id, record).await
    }

    // Caller must hold the project's refresh lock.
    async fn refresh_locked(
        &self,
        project_id: Uuid,
        record: GoogleCredential,
    ) -> Result<GoogleCredential, Error> {
        let refresh_token = record.refresh_token.clone().ok_or_else(|| {
            warn!("Project {} has no refresh token; reauthorization required", project_id);
            Error::Refresh(format!("no refresh token stored for project {project_id}"))
        })?;

        let refreshed = self.oauth.refresh_token(&refresh_token).await?;

        // Google omits the refresh token on the refresh path; carry the
        // stored one forward so the record stays refreshable.
        let updated = GoogleCredential {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or(Some(refresh_token)),
            expires_at: refreshed.expires_at,
        };

        self.token_repo
            .store_token_record(project_id, &updated)
            .await?;

        info!(
            "Refreshed Google credential for project {} (new expiry {:?})",
            project_id, updated.expires_at
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::google::MockOAuthClient;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    struct MemoryTokenRepo {
        records: RwLock<std::collections::HashMap<Uuid, GoogleCredential>>,
    }

    impl MemoryTokenRepo {
        fn new() -> Self {
            Self { records: RwLock::new(std::collections::HashMap::new()) }
        }

        async fn seed(&self, project_id: Uuid, cred: GoogleCredential) {
            self.records.write().await.insert(project_id, cred);
        }
    }

    #[async_trait]
    impl GoogleTokenRepository for MemoryTokenRepo {
        async fn store_token_record(
            &self,
            project_id: Uuid,
            credential: &GoogleCredential,
        ) -> Result<(), Error> {
            self.records.write().await.insert(project_id, credential.clone());
            Ok(())
        }

        async fn get_token_record(
            &self,
            project_id: Uuid,
        ) -> Result<Option<GoogleCredential>, Error> {
            Ok(self.records.read().await.get(&project_id).cloned())
        }

        async fn delete_token_record(&self, project_id: Uuid) -> Result<(), Error> {
            self.records.write().await.remove(&project_id);
            Ok(())
        }
    }

    fn test_config() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            redirect_uri: "http://localhost:3000/oauth/callback".into(),
            service_account_email: Some("bot@example.iam.gserviceaccount.com".into()),
        }
    }

    fn expired_credential() -> GoogleCredential {
        GoogleCredential {
            access_token: "stale-token".into(),
            refresh_token: Some("refresh-token".into()),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
        }
    }

    #[test]
    fn consent_url_is_deterministic_and_requests_offline_access() {
        let manager = GoogleAuthManager::new(
            Arc::new(MemoryTokenRepo::new()),
            Arc::new(MockOAuthClient::new()),
            test_config(),
        );

        let url = manager.build_consent_url(Some("opaque-state"));
        assert_eq!(url, manager.build_consent_url(Some("opaque-state")));
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=opaque-state"));
        assert!(url.contains(&urlencoding::encode(
            "https://www.googleapis.com/auth/spreadsheets"
        ).into_owned()));
        assert!(url.contains(&urlencoding::encode(
            "https://www.googleapis.com/auth/calendar.readonly"
        ).into_owned()));
    }

    #[tokio::test]
    async fn missing_record_is_no_credential() {
        let manager = GoogleAuthManager::new(
            Arc::new(MemoryTokenRepo::new()),
            Arc::new(MockOAuthClient::new()),
            test_config(),
        );

        let err = manager.get_valid_credential(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NoCredential(_)));
    }

    #[tokio::test]
    async fn expired_record_triggers_exactly_one_refresh() {
        let project_id = Uuid::new_v4();
        let repo = Arc::new(MemoryTokenRepo::new());
        repo.seed(project_id, expired_credential()).await;

        let mut oauth = MockOAuthClient::new();
        oauth
            .expect_refresh_token()
            .times(1)
            .returning(|_| {
                Ok(GoogleCredential {
                    access_token: "fresh-token".into(),
                    refresh_token: None,
                    expires_at: Some(Utc::now() + Duration::seconds(3600)),
                })
            });

        let manager = GoogleAuthManager::new(repo.clone(), Arc::new(oauth), test_config());

        let cred = manager.get_valid_credential(project_id).await.unwrap();
        assert_eq!(cred.access_token, "fresh-token");
        assert!(cred.expires_at.unwrap() > Utc::now());
        // Stored refresh token carried forward.
        assert_eq!(cred.refresh_token.as_deref(), Some("refresh-token"));

        let stored = repo.get_token_record(project_id).await.unwrap().unwrap();
        assert_eq!(stored, cred);
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_single_refresh() {
        let project_id = Uuid::new_v4();
        let repo = Arc::new(MemoryTokenRepo::new());
        repo.seed(project_id, expired_credential()).await;

        // Hand-rolled double so the refresh can be held in flight long
        // enough for the second caller to arrive and block on the
        // project lock.
        struct SlowOAuthClient {
            refresh_calls: AtomicUsize,
        }

        #[async_trait]
        impl OAuthClient for SlowOAuthClient {
            async fn exchange_code(&self, _code: &str) -> Result<GoogleCredential, Error> {
                unreachable!("exchange is not part of this test")
            }

            async fn refresh_token(&self, _refresh: &str) -> Result<GoogleCredential, Error> {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(GoogleCredential {
                    access_token: "fresh-token".into(),
                    refresh_token: None,
                    expires_at: Some(Utc::now() + Duration::seconds(3600)),
                })
            }
        }

        let oauth = Arc::new(SlowOAuthClient { refresh_calls: AtomicUsize::new(0) });

        let manager = Arc::new(GoogleAuthManager::new(
            repo,
            oauth.clone(),
            test_config(),
        ));

        let a = {
            let m = manager.clone();
            tokio::spawn(async move { m.get_valid_credential(project_id).await })
        };
        let b = {
            let m = manager.clone();
            tokio::spawn(async move { m.get_valid_credential(project_id).await })
        };

        let cred_a = a.await.unwrap().unwrap();
        let cred_b = b.await.unwrap().unwrap();
        assert_eq!(cred_a.access_token, "fresh-token");
        assert_eq!(cred_b.access_token, "fresh-token");
        assert_eq!(oauth.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_refresh_token_is_terminal() {
        let project_id = Uuid::new_v4();
        let repo = Arc::new(MemoryTokenRepo::new());
        repo.seed(
            project_id,
            GoogleCredential {
                access_token: "stale-token".into(),
                refresh_token: None,
                expires_at: Some(Utc::now() - Duration::seconds(1)),
            },
        )
        .await;

        let manager = GoogleAuthManager::new(
            repo,
            Arc::new(MockOAuthClient::new()),
            test_config(),
        );

        let err = manager.get_valid_credential(project_id).await.unwrap_err();
        assert!(matches!(err, Error::Refresh(_)));
    }

    #[tokio::test]
    async fn valid_record_is_returned_without_refresh() {
        let project_id = Uuid::new_v4();
        let repo = Arc::new(MemoryTokenRepo::new());
        let cred = GoogleCredential {
            access_token: "live-token".into(),
            refresh_token: Some("refresh-token".into()),
            expires_at: Some(Utc::now() + Duration::seconds(3600)),
        };
        repo.seed(project_id, cred.clone()).await;

        // No expectations registered: any remote call would panic.
        let manager = GoogleAuthManager::new(
            repo,
            Arc::new(MockOAuthClient::new()),
            test_config(),
        );

        let got = manager.get_valid_credential(project_id).await.unwrap();
        assert_eq!(got, cred);
    }
}
