//! PostgreSQL implementation of TermRepository.
//!
//! Primitive operations only. The upsert policy (update-or-create with full
//! replacement of the definition set) lives in caseflow-service so it is
//! exercised against mocks as well.

use async_trait::async_trait;
use caseflow_core::{new_v7, Definition, Error, Result, Term, TermRepository};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgTermRepository {
    pool: Pool<Postgres>,
}

impl PgTermRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_term(row: &PgRow) -> Term {
        Term {
            id: row.get("id"),
            project_id: row.get("project_id"),
            text: row.get("text"),
            discoverable: row.get("discoverable"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_definition(row: &PgRow) -> Definition {
        Definition {
            id: row.get("id"),
            project_id: row.get("project_id"),
            text: row.get("text"),
            source: row.get("source"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl TermRepository for PgTermRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Term>> {
        let row = sqlx::query(
            "SELECT id, project_id, text, discoverable, created_at, updated_at \
             FROM term WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_term(&r)))
    }

    async fn get_by_text(&self, project_id: Uuid, text: &str) -> Result<Option<Term>> {
        let row = sqlx::query(
            "SELECT id, project_id, text, discoverable, created_at, updated_at \
             FROM term WHERE project_id = $1 AND text = $2",
        )
        .bind(project_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_term(&r)))
    }

    async fn get_all(&self, project_id: Uuid) -> Result<Vec<Term>> {
        let rows = sqlx::query(
            "SELECT id, project_id, text, discoverable, created_at, updated_at \
             FROM term WHERE project_id = $1 ORDER BY text",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_term).collect())
    }

    async fn create(&self, project_id: Uuid, text: &str, discoverable: bool) -> Result<Term> {
        let row = sqlx::query(
            "INSERT INTO term (id, project_id, text, discoverable) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, text, discoverable, created_at, updated_at",
        )
        .bind(new_v7())
        .bind(project_id)
        .bind(text)
        .bind(discoverable)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_term(&row))
    }

    async fn update_base(&self, id: Uuid, discoverable: Option<bool>) -> Result<Term> {
        let row = sqlx::query(
            "UPDATE term SET \
                 discoverable = COALESCE($2, discoverable), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, project_id, text, discoverable, created_at, updated_at",
        )
        .bind(id)
        .bind(discoverable)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(r) => Ok(Self::row_to_term(&r)),
            None => Err(Error::TermNotFound(id)),
        }
    }

    async fn set_definitions(&self, term_id: Uuid, definition_ids: &[Uuid]) -> Result<()> {
        // Full replacement of the association set, not a merge.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM term_definition WHERE term_id = $1")
            .bind(term_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for definition_id in definition_ids {
            sqlx::query(
                "INSERT INTO term_definition (term_id, definition_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(term_id)
            .bind(definition_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn get_definitions(&self, term_id: Uuid) -> Result<Vec<Definition>> {
        let rows = sqlx::query(
            "SELECT d.id, d.project_id, d.text, d.source, d.created_at, d.updated_at \
             FROM definition d \
             JOIN term_definition td ON td.definition_id = d.id \
             WHERE td.term_id = $1 \
             ORDER BY d.text",
        )
        .bind(term_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_definition).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Associations cascade via term_definition FKs.
        sqlx::query("DELETE FROM term WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
