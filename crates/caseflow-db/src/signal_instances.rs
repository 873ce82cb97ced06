//! PostgreSQL implementation of SignalInstanceRepository.

use async_trait::async_trait;
use caseflow_core::{
    new_v7, Entity, EntityCreate, Error, Result, SignalInstance, SignalInstanceRepository,
};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgSignalInstanceRepository {
    pool: Pool<Postgres>,
}

impl PgSignalInstanceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_instance(row: &PgRow) -> SignalInstance {
        SignalInstance {
            id: row.get("id"),
            signal_id: row.get("signal_id"),
            case_id: row.get("case_id"),
            project_id: row.get("project_id"),
            raw: row.get("raw"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl SignalInstanceRepository for PgSignalInstanceRepository {
    async fn get(&self, id: Uuid) -> Result<Option<SignalInstance>> {
        let row = sqlx::query(
            "SELECT id, signal_id, case_id, project_id, raw, created_at \
             FROM signal_instance WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_instance(&r)))
    }

    async fn create(
        &self,
        signal_id: Uuid,
        project_id: Uuid,
        case_id: Option<Uuid>,
        raw: serde_json::Value,
    ) -> Result<SignalInstance> {
        let row = sqlx::query(
            "INSERT INTO signal_instance (id, signal_id, project_id, case_id, raw) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, signal_id, case_id, project_id, raw, created_at",
        )
        .bind(new_v7())
        .bind(signal_id)
        .bind(project_id)
        .bind(case_id)
        .bind(raw)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_instance(&row))
    }

    async fn replace_entities(&self, instance_id: Uuid, entities: &[EntityCreate]) -> Result<()> {
        let project_id: Uuid = sqlx::query_scalar(
            "SELECT project_id FROM signal_instance WHERE id = $1",
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::SignalInstanceNotFound(instance_id))?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM signal_instance_entity WHERE signal_instance_id = $1")
            .bind(instance_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for entity in entities {
            // Entities are shared across instances: upsert by
            // (project, type, value), then associate.
            let entity_id: Uuid = sqlx::query_scalar(
                "INSERT INTO entity (id, project_id, entity_type_id, value) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (project_id, entity_type_id, value) \
                    DO UPDATE SET value = EXCLUDED.value \
                 RETURNING id",
            )
            .bind(new_v7())
            .bind(project_id)
            .bind(entity.entity_type_id)
            .bind(&entity.value)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;

            sqlx::query(
                "INSERT INTO signal_instance_entity (signal_instance_id, entity_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(instance_id)
            .bind(entity_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn get_entities(&self, instance_id: Uuid) -> Result<Vec<Entity>> {
        let rows = sqlx::query(
            "SELECT e.id, e.project_id, e.entity_type_id, e.value, e.created_at \
             FROM entity e \
             JOIN signal_instance_entity sie ON sie.entity_id = e.id \
             WHERE sie.signal_instance_id = $1 \
             ORDER BY e.value",
        )
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| Entity {
                id: r.get("id"),
                project_id: r.get("project_id"),
                entity_type_id: r.get("entity_type_id"),
                value: r.get("value"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
