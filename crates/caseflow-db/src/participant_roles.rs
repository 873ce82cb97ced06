//! PostgreSQL implementation of ParticipantRoleRepository.

use async_trait::async_trait;
use caseflow_core::{
    new_v7, Error, ParticipantRole, ParticipantRoleCreate, ParticipantRoleRepository, Result,
};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgParticipantRoleRepository {
    pool: Pool<Postgres>,
}

impl PgParticipantRoleRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_role(row: &PgRow) -> ParticipantRole {
        ParticipantRole {
            id: row.get("id"),
            participant_id: row.get("participant_id"),
            role: row.get("role"),
            assumed_at: row.get("assumed_at"),
            renounced_at: row.get("renounced_at"),
        }
    }
}

#[async_trait]
impl ParticipantRoleRepository for PgParticipantRoleRepository {
    async fn create(
        &self,
        participant_id: Uuid,
        req: ParticipantRoleCreate,
    ) -> Result<ParticipantRole> {
        // Unconditional append: repeated assignments of the same role name
        // produce distinct historical records.
        let row = sqlx::query(
            "INSERT INTO participant_role (id, participant_id, role) \
             VALUES ($1, $2, $3) \
             RETURNING id, participant_id, role, assumed_at, renounced_at",
        )
        .bind(new_v7())
        .bind(participant_id)
        .bind(&req.role)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::row_to_role(&row))
    }

    async fn get_all_by_participant(&self, participant_id: Uuid) -> Result<Vec<ParticipantRole>> {
        let rows = sqlx::query(
            "SELECT id, participant_id, role, assumed_at, renounced_at \
             FROM participant_role \
             WHERE participant_id = $1 \
             ORDER BY assumed_at",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_role).collect())
    }

    async fn get_active_roles(&self, participant_id: Uuid) -> Result<Vec<ParticipantRole>> {
        let rows = sqlx::query(
            "SELECT id, participant_id, role, assumed_at, renounced_at \
             FROM participant_role \
             WHERE participant_id = $1 AND renounced_at IS NULL \
             ORDER BY assumed_at",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_role).collect())
    }

    async fn renounce(&self, role_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE participant_role SET renounced_at = now() \
             WHERE id = $1 AND renounced_at IS NULL",
        )
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Active participant role {} not found",
                role_id
            )));
        }
        Ok(())
    }
}
