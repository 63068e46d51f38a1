use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::Error;
use botwizard_common::traits::repository_traits::SettingsRepository;

/// Per-project key/value settings, upsert on (project_id, key).
#[derive(Clone)]
pub struct PostgresSettingsRepository {
    pool: Pool<Postgres>,
}

impl PostgresSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn get_value(&self, project_id: Uuid, key: &str) -> Result<Option<String>, Error> {
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

    async fn set_value(&self, project_id: Uuid, key: &str, value: &str) -> Result<(), Error> {
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
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_value(&self, project_id: Uuid, key: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            DELETE FROM settings
            WHERE project_id = $1 AND key = $2
            "#,
        )
            .bind(project_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
