// src/repositories/postgres/message_log.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::Error;
use botwizard_common::models::MessageLogEntry;
use botwizard_common::traits::repository_traits::MessageLogRepository;

/// Postgres-backed append-only message log.
#[derive(Clone)]
pub struct PostgresMessageLogRepository {
    pool: Pool<Postgres>,
}

impl PostgresMessageLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageLogRepository for PostgresMessageLogRepository {
    async fn insert(&self, entry: &MessageLogEntry) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                message_id, project_id, chat_id, user_id,
                message_text, bot_response, response_time_ms,
                is_escalated, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
            .bind(entry.message_id)
            .bind(entry.project_id)
            .bind(&entry.chat_id)
            .bind(&entry.user_id)
            .bind(&entry.message_text)
            .bind(&entry.bot_response)
            .bind(entry.response_time_ms)
            .bind(entry.is_escalated)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fetch_in_range(
        &self,
        project_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageLogEntry>, Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, MessageLogEntry>(
            r#"
            SELECT
                message_id, project_id, chat_id, user_id,
                message_text, bot_response, response_time_ms,
                is_escalated, created_at
            FROM messages
            WHERE project_id = ANY($1)
              AND created_at >= $2
              AND created_at <= $3
            ORDER BY created_at
            "#,
        )
            .bind(project_ids)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
