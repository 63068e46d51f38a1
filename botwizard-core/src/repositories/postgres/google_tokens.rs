use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::Error;
use botwizard_common::models::{GoogleCredential, SpreadsheetBinding};
use botwizard_common::traits::repository_traits::{GoogleTokenRepository, SheetBindingRepository};

// On-disk contract: these settings keys are shared with the bot runtime
// and must not be renamed.
pub const KEY_ACCESS_TOKEN: &str = "google_access_token";
pub const KEY_REFRESH_TOKEN: &str = "google_refresh_token";
pub const KEY_TOKEN_EXPIRES: &str = "google_token_expires";
pub const KEY_SHEET_ID: &str = "google_sheet_id";
pub const KEY_SHEET_URL: &str = "google_sheet_url";

/// Persists the delegated Google credential and the spreadsheet binding
/// through the per-project settings table.
#[derive(Clone)]
pub struct PostgresGoogleTokenRepository {
    pool: Pool<Postgres>,
}

impl PostgresGoogleTokenRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn upsert_in_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        project_id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO settings (setting_id, project_id, key, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            ON CONFLICT (project_id, key) DO UPDATE
               SET value      = EXCLUDED.value,
                   updated_at = now()
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(project_id)
            .bind(key)
            .bind(value)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn delete_in_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        project_id: Uuid,
        key: &str,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            DELETE FROM settings
            WHERE project_id = $1 AND key = $2
            "#,
        )
            .bind(project_id)
            .bind(key)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn get_key(&self, project_id: Uuid, key: &str) -> Result<Option<String>, Error> {
        let row = sqlx::query(
            r#"
            SELECT value
            FROM settings
            WHERE project_id = $1 AND key = $2
            "#,
        )
            .bind(project_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(r.try_get("value")?),
            None => Ok(None),
        }
    }
}

/// Expiry is stored as a millisecond epoch string under
/// `google_token_expires`, the same wire format the bot runtime writes.
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[async_trait]
impl GoogleTokenRepository for PostgresGoogleTokenRepository {
    async fn store_token_record(
        &self,
        project_id: Uuid,
        credential: &GoogleCredential,
    ) -> Result<(), Error> {
        // All three keys change together or not at all, so a concurrent
        // reader never observes a fresh access token with a stale expiry.
        let mut tx = self.pool.begin().await?;

        Self::upsert_in_tx(&mut tx, project_id, KEY_ACCESS_TOKEN, &credential.access_token).await?;

        if let Some(refresh) = &credential.refresh_token {
            Self::upsert_in_tx(&mut tx, project_id, KEY_REFRESH_TOKEN, refresh).await?;
        }

        match credential.expires_at {
            Some(at) => {
                let ms = at.timestamp_millis().to_string();
                Self::upsert_in_tx(&mut tx, project_id, KEY_TOKEN_EXPIRES, &ms).await?;
            }
            None => {
                Self::delete_in_tx(&mut tx, project_id, KEY_TOKEN_EXPIRES).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_token_record(&self, project_id: Uuid) -> Result<Option<GoogleCredential>, Error> {
        let access_token = match self.get_key(project_id, KEY_ACCESS_TOKEN).await? {
            Some(v) => v,
            None => return Ok(None),
        };
        let refresh_token = self.get_key(project_id, KEY_REFRESH_TOKEN).await?;
        let expires_at = self
            .get_key(project_id, KEY_TOKEN_EXPIRES)
            .await?
            .as_deref()
            .and_then(parse_expiry);

        Ok(Some(GoogleCredential {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    async fn delete_token_record(&self, project_id: Uuid) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        Self::delete_in_tx(&mut tx, project_id, KEY_ACCESS_TOKEN).await?;
        Self::delete_in_tx(&mut tx, project_id, KEY_REFRESH_TOKEN).await?;
        Self::delete_in_tx(&mut tx, project_id, KEY_TOKEN_EXPIRES).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SheetBindingRepository for PostgresGoogleTokenRepository {
    async fn store_binding(&self, binding: &SpreadsheetBinding) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_in_tx(&mut tx, binding.project_id, KEY_SHEET_ID, &binding.spreadsheet_id)
            .await?;
        Self::upsert_in_tx(&mut tx, binding.project_id, KEY_SHEET_URL, &binding.url).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_binding(&self, project_id: Uuid) -> Result<Option<SpreadsheetBinding>, Error> {
        let spreadsheet_id = match self.get_key(project_id, KEY_SHEET_ID).await? {
            Some(v) => v,
            None => return Ok(None),
        };
        let url = self
            .get_key(project_id, KEY_SHEET_URL)
            .await?
            .unwrap_or_else(|| botwizard_common::models::sheet::canonical_url(&spreadsheet_id));

        Ok(Some(SpreadsheetBinding {
            project_id,
            spreadsheet_id,
            url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_round_trips_millisecond_epoch() {
        let at = Utc.timestamp_millis_opt(1_756_000_000_123).single().unwrap();
        let encoded = at.timestamp_millis().to_string();
        assert_eq!(parse_expiry(&encoded), Some(at));
    }

    #[test]
    fn garbage_expiry_is_ignored() {
        assert_eq!(parse_expiry("not-a-number"), None);
    }
}
