//! PostgreSQL implementation of EntityTypeRepository.

use async_trait::async_trait;
use caseflow_core::{
    new_v7, CreateEntityTypeRequest, EntityScope, EntityType, EntityTypeRepository, Error, Result,
};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

const ENTITY_TYPE_COLUMNS: &str = "id, project_id, name, description, scope::TEXT, \
     regular_expression, jpath, enabled, created_at, updated_at";

pub struct PgEntityTypeRepository {
    pool: Pool<Postgres>,
}

impl PgEntityTypeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_scope(s: &str) -> EntityScope {
        s.parse().unwrap_or_default()
    }

    fn row_to_entity_type(row: &PgRow) -> EntityType {
        EntityType {
            id: row.get("id"),
            project_id: row.get("project_id"),
            name: row.get("name"),
            description: row.get("description"),
            scope: Self::parse_scope(row.get("scope")),
            regular_expression: row.get("regular_expression"),
            jpath: row.get("jpath"),
            enabled: row.get("enabled"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl EntityTypeRepository for PgEntityTypeRepository {
    async fn get(&self, id: Uuid) -> Result<Option<EntityType>> {
        let row = sqlx::query(&format!(
            "SELECT {ENTITY_TYPE_COLUMNS} FROM entity_type WHERE id = $1",
            ENTITY_TYPE_COLUMNS = ENTITY_TYPE_COLUMNS,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_entity_type(&r)))
    }

    async fn get_all(
        &self,
        project_id: Uuid,
        scope: Option<EntityScope>,
    ) -> Result<Vec<EntityType>> {
        let rows = match scope {
            Some(scope) => {
                sqlx::query(&format!(
                    "SELECT {ENTITY_TYPE_COLUMNS} FROM entity_type \
                     WHERE project_id = $1 AND scope = $2::entity_scope \
                     ORDER BY name",
                    ENTITY_TYPE_COLUMNS = ENTITY_TYPE_COLUMNS,
                ))
                .bind(project_id)
                .bind(scope.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {ENTITY_TYPE_COLUMNS} FROM entity_type \
                     WHERE project_id = $1 \
                     ORDER BY name",
                    ENTITY_TYPE_COLUMNS = ENTITY_TYPE_COLUMNS,
                ))
                .bind(project_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_entity_type).collect())
    }

    async fn get_for_signal(&self, signal_id: Uuid) -> Result<Vec<EntityType>> {
        let rows = sqlx::query(
            "SELECT et.id, et.project_id, et.name, et.description, et.scope::TEXT, \
                    et.regular_expression, et.jpath, et.enabled, et.created_at, et.updated_at \
             FROM entity_type et \
             JOIN signal_entity_type sa ON sa.entity_type_id = et.id \
             WHERE sa.signal_id = $1 \
             ORDER BY et.name",
        )
        .bind(signal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_entity_type).collect())
    }

    async fn create(&self, req: CreateEntityTypeRequest) -> Result<EntityType> {
        let row = sqlx::query(&format!(
            "INSERT INTO entity_type ( \
                 id, project_id, name, description, scope, \
                 regular_expression, jpath, enabled \
             ) VALUES ($1, $2, $3, $4, $5::entity_scope, $6, $7, $8) \
             RETURNING {ENTITY_TYPE_COLUMNS}",
            ENTITY_TYPE_COLUMNS = ENTITY_TYPE_COLUMNS,
        ))
        .bind(new_v7())
        .bind(req.project_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.scope.to_string())
        .bind(&req.regular_expression)
        .bind(&req.jpath)
        .bind(req.enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_entity_type(&row))
    }

    async fn associate_with_signal(&self, entity_type_id: Uuid, signal_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO signal_entity_type (signal_id, entity_type_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(signal_id)
        .bind(entity_type_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
