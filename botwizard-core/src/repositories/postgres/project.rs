use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::Error;
use botwizard_common::models::Project;
use botwizard_common::traits::repository_traits::ProjectRepository;

#[derive(Clone)]
pub struct PostgresProjectRepository {
    pool: Pool<Postgres>,
}

impl PostgresProjectRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, Error> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            SELECT project_id, user_id, name, description, status, created_at, updated_at
            FROM projects
            WHERE project_id = $1
            "#,
        )
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn project_ids_for_owner(&self, user_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT project_id
            FROM projects
            WHERE user_id = $1
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get("project_id")?);
        }
        Ok(ids)
    }
}
