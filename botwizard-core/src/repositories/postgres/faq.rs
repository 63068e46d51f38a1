use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::Error;
use botwizard_common::models::FaqEntry;
use botwizard_common::traits::repository_traits::FaqRepository;

#[derive(Clone)]
pub struct PostgresFaqRepository {
    pool: Pool<Postgres>,
}

impl PostgresFaqRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FaqRepository for PostgresFaqRepository {
    async fn active_for_project(&self, project_id: Uuid) -> Result<Vec<FaqEntry>, Error> {
        let rows = sqlx::query_as::<_, FaqEntry>(
            r#"
            SELECT faq_id, project_id, question, answer, keywords, priority, is_active
            FROM faq
            WHERE project_id = $1 AND is_active = TRUE
            ORDER BY priority DESC, created_at
            "#,
        )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
