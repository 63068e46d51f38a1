use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::Error;
use botwizard_common::models::Channel;
use botwizard_common::traits::repository_traits::ChannelRepository;

#[derive(Clone)]
pub struct PostgresChannelRepository {
    pool: Pool<Postgres>,
}

impl PostgresChannelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PostgresChannelRepository {
    async fn active_for_project(&self, project_id: Uuid) -> Result<Vec<Channel>, Error> {
        let rows = sqlx::query_as::<_, Channel>(
            r#"
            SELECT channel_id, project_id, channel_type, chat_id,
                   chat_title, is_active, created_at
            FROM channels
            WHERE project_id = $1 AND is_active = TRUE
            ORDER BY created_at
            "#,
        )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
