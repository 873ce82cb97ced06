//! PostgreSQL implementation of IndividualContactRepository.

use async_trait::async_trait;
use caseflow_core::{new_v7, Error, IndividualContact, IndividualContactRepository, Result};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgIndividualContactRepository {
    pool: Pool<Postgres>,
}

impl PgIndividualContactRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_individual(row: &PgRow) -> IndividualContact {
        IndividualContact {
            id: row.get("id"),
            project_id: row.get("project_id"),
            email: row.get("email"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl IndividualContactRepository for PgIndividualContactRepository {
    async fn get(&self, id: Uuid) -> Result<Option<IndividualContact>> {
        let row = sqlx::query(
            "SELECT id, project_id, email, name, created_at \
             FROM individual_contact WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_individual(&r)))
    }

    async fn get_by_email(
        &self,
        project_id: Uuid,
        email: &str,
    ) -> Result<Option<IndividualContact>> {
        let row = sqlx::query(
            "SELECT id, project_id, email, name, created_at \
             FROM individual_contact WHERE project_id = $1 AND email = $2",
        )
        .bind(project_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_individual(&r)))
    }

    async fn create(
        &self,
        project_id: Uuid,
        email: &str,
        name: Option<&str>,
    ) -> Result<IndividualContact> {
        let row = sqlx::query(
            "INSERT INTO individual_contact (id, project_id, email, name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, email, name, created_at",
        )
        .bind(new_v7())
        .bind(project_id)
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_individual(&row))
    }
}
