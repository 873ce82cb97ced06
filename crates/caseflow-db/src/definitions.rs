//! PostgreSQL implementation of DefinitionRepository.

use async_trait::async_trait;
use caseflow_core::{defaults, new_v7, Definition, DefinitionRepository, Error, Result};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgDefinitionRepository {
    pool: Pool<Postgres>,
}

impl PgDefinitionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
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
impl DefinitionRepository for PgDefinitionRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Definition>> {
        let row = sqlx::query(
            "SELECT id, project_id, text, source, created_at, updated_at \
             FROM definition WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_definition(&r)))
    }

    async fn get_by_text(&self, project_id: Uuid, text: &str) -> Result<Option<Definition>> {
        let row = sqlx::query(
            "SELECT id, project_id, text, source, created_at, updated_at \
             FROM definition WHERE project_id = $1 AND text = $2",
        )
        .bind(project_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_definition(&r)))
    }

    async fn create(
        &self,
        project_id: Uuid,
        text: &str,
        source: Option<&str>,
    ) -> Result<Definition> {
        let row = sqlx::query(
            "INSERT INTO definition (id, project_id, text, source) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, text, source, created_at, updated_at",
        )
        .bind(new_v7())
        .bind(project_id)
        .bind(text)
        .bind(source.unwrap_or(defaults::DEFINITION_SOURCE))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_definition(&row))
    }

    async fn update_source(&self, id: Uuid, source: &str) -> Result<Definition> {
        let row = sqlx::query(
            "UPDATE definition SET source = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, project_id, text, source, created_at, updated_at",
        )
        .bind(id)
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(r) => Ok(Self::row_to_definition(&r)),
            None => Err(Error::NotFound(format!("Definition {} not found", id))),
        }
    }

    async fn set_teams(&self, definition_id: Uuid, team_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM definition_team WHERE definition_id = $1")
            .bind(definition_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for team_id in team_ids {
            sqlx::query(
                "INSERT INTO definition_team (definition_id, team_contact_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(definition_id)
            .bind(team_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM definition WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
