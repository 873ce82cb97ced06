//! PostgreSQL implementation of OncallServiceRepository.

use async_trait::async_trait;
use caseflow_core::{new_v7, Error, OncallService, OncallServiceRepository, Result};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgOncallServiceRepository {
    pool: Pool<Postgres>,
}

impl PgOncallServiceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_service(row: &PgRow) -> OncallService {
        OncallService {
            id: row.get("id"),
            project_id: row.get("project_id"),
            external_id: row.get("external_id"),
            name: row.get("name"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl OncallServiceRepository for PgOncallServiceRepository {
    async fn get(&self, id: Uuid) -> Result<Option<OncallService>> {
        let row = sqlx::query(
            "SELECT id, project_id, external_id, name, is_active, created_at \
             FROM oncall_service WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_service(&r)))
    }

    async fn get_by_external_id(
        &self,
        project_id: Uuid,
        external_id: &str,
    ) -> Result<Option<OncallService>> {
        let row = sqlx::query(
            "SELECT id, project_id, external_id, name, is_active, created_at \
             FROM oncall_service WHERE project_id = $1 AND external_id = $2",
        )
        .bind(project_id)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_service(&r)))
    }

    async fn create(
        &self,
        project_id: Uuid,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<OncallService> {
        let row = sqlx::query(
            "INSERT INTO oncall_service (id, project_id, name, external_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, external_id, name, is_active, created_at",
        )
        .bind(new_v7())
        .bind(project_id)
        .bind(name)
        .bind(external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_service(&row))
    }
}
