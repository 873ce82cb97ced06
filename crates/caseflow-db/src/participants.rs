//! PostgreSQL implementation of ParticipantRepository.
//!
//! Pair uniqueness for (subject, individual) is enforced by partial unique
//! indexes in the schema; `create` surfaces a violation as
//! `Error::Database`, which the resolver detects via
//! `Error::is_unique_violation`.

use async_trait::async_trait;
use caseflow_core::{
    new_v7, CreateParticipantRequest, Error, IndividualContactReadMinimal, OncallServiceReadMinimal,
    Participant, ParticipantRead, ParticipantReadMinimal, ParticipantRepository, ParticipantRole,
    Result, SubjectKind, SubjectRef, UpdateParticipantRequest,
};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

const PARTICIPANT_COLUMNS: &str = "id, incident_id, case_id, individual_contact_id, service_id, \
     team, department, location, added_by_id, added_reason, \
     after_hours_notification, user_conversation_id, created_at, updated_at";

pub struct PgParticipantRepository {
    pool: Pool<Postgres>,
}

impl PgParticipantRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_participant(row: &PgRow) -> Participant {
        Participant {
            id: row.get("id"),
            incident_id: row.get("incident_id"),
            case_id: row.get("case_id"),
            individual_contact_id: row.get("individual_contact_id"),
            service_id: row.get("service_id"),
            team: row.get("team"),
            department: row.get("department"),
            location: row.get("location"),
            added_by_id: row.get("added_by_id"),
            added_reason: row.get("added_reason"),
            after_hours_notification: row.get("after_hours_notification"),
            user_conversation_id: row.get("user_conversation_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn subject_column(kind: SubjectKind) -> &'static str {
        match kind {
            SubjectKind::Incident => "incident_id",
            SubjectKind::Case => "case_id",
        }
    }

    /// Participant holding an active (non-renounced) role, joined through
    /// participant_role.
    async fn get_by_subject_column_and_role(
        &self,
        column: &str,
        subject_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>> {
        let sql = format!(
            "SELECT DISTINCT p.{PARTICIPANT_COLUMNS} \
             FROM participant p \
             JOIN participant_role pr ON pr.participant_id = p.id \
             WHERE p.{column} = $1 \
               AND pr.renounced_at IS NULL \
               AND pr.role = $2",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS.replace(", ", ", p."),
            column = column,
        );

        let row = sqlx::query(&sql)
            .bind(subject_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_participant(&r)))
    }

    async fn get_by_subject_column_and_email(
        &self,
        column: &str,
        subject_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>> {
        let sql = format!(
            "SELECT p.{PARTICIPANT_COLUMNS} \
             FROM participant p \
             JOIN individual_contact ic ON ic.id = p.individual_contact_id \
             WHERE p.{column} = $1 AND ic.email = $2",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS.replace(", ", ", p."),
            column = column,
        );

        let row = sqlx::query(&sql)
            .bind(subject_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_participant(&r)))
    }

    async fn get_by_subject_column_and_service(
        &self,
        column: &str,
        subject_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>> {
        // First match wins; multiple bindings to one service are not an
        // error here.
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participant \
             WHERE {column} = $1 AND service_id = $2 \
             ORDER BY created_at \
             LIMIT 1",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
            column = column,
        );

        let row = sqlx::query(&sql)
            .bind(subject_id)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_participant(&r)))
    }

    async fn get_by_subject_column_and_conversation(
        &self,
        column: &str,
        subject_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participant \
             WHERE {column} = $1 AND user_conversation_id = $2",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
            column = column,
        );

        let row = sqlx::query(&sql)
            .bind(subject_id)
            .bind(user_conversation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_participant(&r)))
    }

    async fn get_all_by_subject_column(
        &self,
        column: &str,
        subject_id: Uuid,
    ) -> Result<Vec<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participant \
             WHERE {column} = $1 \
             ORDER BY created_at",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
            column = column,
        );

        let rows = sqlx::query(&sql)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_participant).collect())
    }

    /// Insert one participant plus its roles inside an existing transaction.
    async fn insert_in_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        req: &CreateParticipantRequest,
    ) -> Result<Participant> {
        let id = new_v7();
        let (incident_id, case_id) = match req.subject.kind {
            SubjectKind::Incident => (Some(req.subject.id), None),
            SubjectKind::Case => (None, Some(req.subject.id)),
        };

        let row = sqlx::query(&format!(
            "INSERT INTO participant ( \
                 id, incident_id, case_id, individual_contact_id, service_id, \
                 team, department, location, added_by_id, added_reason \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PARTICIPANT_COLUMNS}",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
        ))
        .bind(id)
        .bind(incident_id)
        .bind(case_id)
        .bind(req.individual_contact_id)
        .bind(req.service_id)
        .bind(&req.team)
        .bind(&req.department)
        .bind(&req.location)
        .bind(req.added_by_id)
        .bind(&req.added_reason)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        for role in &req.roles {
            sqlx::query(
                "INSERT INTO participant_role (id, participant_id, role) VALUES ($1, $2, $3)",
            )
            .bind(new_v7())
            .bind(id)
            .bind(&role.role)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }

        Ok(Self::row_to_participant(&row))
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Participant>> {
        let row = sqlx::query(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participant WHERE id = $1",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_participant(&r)))
    }

    async fn get_by_individual_contact_id(
        &self,
        individual_id: Uuid,
    ) -> Result<Vec<Participant>> {
        let rows = sqlx::query(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participant \
             WHERE individual_contact_id = $1 \
             ORDER BY created_at",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
        ))
        .bind(individual_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_participant).collect())
    }

    async fn get_all_by_incident_id(&self, incident_id: Uuid) -> Result<Vec<Participant>> {
        self.get_all_by_subject_column("incident_id", incident_id)
            .await
    }

    async fn get_all_by_case_id(&self, case_id: Uuid) -> Result<Vec<Participant>> {
        self.get_all_by_subject_column("case_id", case_id).await
    }

    async fn get_by_subject_and_individual(
        &self,
        subject: SubjectRef,
        individual_id: Uuid,
    ) -> Result<Option<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participant \
             WHERE {column} = $1 AND individual_contact_id = $2",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
            column = Self::subject_column(subject.kind),
        );

        let row = sqlx::query(&sql)
            .bind(subject.id)
            .bind(individual_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_participant(&r)))
    }

    async fn get_by_incident_id_and_role(
        &self,
        incident_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_role("incident_id", incident_id, role)
            .await
    }

    async fn get_by_case_id_and_role(
        &self,
        case_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_role("case_id", case_id, role)
            .await
    }

    async fn get_by_incident_id_and_email(
        &self,
        incident_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_email("incident_id", incident_id, email)
            .await
    }

    async fn get_by_case_id_and_email(
        &self,
        case_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_email("case_id", case_id, email)
            .await
    }

    async fn get_by_incident_id_and_service_id(
        &self,
        incident_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_service("incident_id", incident_id, service_id)
            .await
    }

    async fn get_by_case_id_and_service_id(
        &self,
        case_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_service("case_id", case_id, service_id)
            .await
    }

    async fn get_by_incident_id_and_conversation_id(
        &self,
        incident_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_conversation(
            "incident_id",
            incident_id,
            user_conversation_id,
        )
        .await
    }

    async fn get_by_case_id_and_conversation_id(
        &self,
        case_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_column_and_conversation("case_id", case_id, user_conversation_id)
            .await
    }

    async fn create(&self, req: CreateParticipantRequest) -> Result<Participant> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let participant = Self::insert_in_tx(&mut tx, &req).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "participants",
            op = "create",
            participant_id = %participant.id,
            role_count = req.roles.len(),
            "Created participant"
        );
        Ok(participant)
    }

    async fn create_all(
        &self,
        reqs: Vec<CreateParticipantRequest>,
    ) -> Result<Vec<Participant>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut participants = Vec::with_capacity(reqs.len());
        for req in &reqs {
            participants.push(Self::insert_in_tx(&mut tx, req).await?);
        }
        tx.commit().await.map_err(Error::Database)?;
        Ok(participants)
    }

    async fn update(&self, id: Uuid, req: UpdateParticipantRequest) -> Result<Participant> {
        let row = sqlx::query(&format!(
            "UPDATE participant SET \
                 team = COALESCE($2, team), \
                 department = COALESCE($3, department), \
                 location = COALESCE($4, location), \
                 added_reason = COALESCE($5, added_reason), \
                 after_hours_notification = COALESCE($6, after_hours_notification), \
                 user_conversation_id = COALESCE($7, user_conversation_id), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {PARTICIPANT_COLUMNS}",
            PARTICIPANT_COLUMNS = PARTICIPANT_COLUMNS,
        ))
        .bind(id)
        .bind(&req.team)
        .bind(&req.department)
        .bind(&req.location)
        .bind(&req.added_reason)
        .bind(req.after_hours_notification)
        .bind(&req.user_conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(r) => Ok(Self::row_to_participant(&r)),
            None => Err(Error::ParticipantNotFound(id)),
        }
    }

    async fn associate_service_once(&self, id: Uuid, service_id: Uuid) -> Result<bool> {
        // First association wins; an existing binding is never overwritten.
        let result = sqlx::query(
            "UPDATE participant SET service_id = $2, updated_at = now() \
             WHERE id = $1 AND service_id IS NULL",
        )
        .bind(id)
        .bind(service_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM participant WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch_read(&self, id: Uuid) -> Result<Option<ParticipantRead>> {
        let Some(participant) = self.get(id).await? else {
            return Ok(None);
        };

        let individual_row = sqlx::query(
            "SELECT id, email, name FROM individual_contact WHERE id = $1",
        )
        .bind(participant.individual_contact_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let individual = IndividualContactReadMinimal {
            id: individual_row.get("id"),
            email: individual_row.get("email"),
            name: individual_row.get("name"),
        };

        let service = match participant.service_id {
            Some(service_id) => sqlx::query("SELECT id, name FROM oncall_service WHERE id = $1")
                .bind(service_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?
                .map(|r| OncallServiceReadMinimal {
                    id: r.get("id"),
                    name: r.get("name"),
                }),
            None => None,
        };

        let role_rows = sqlx::query(
            "SELECT id, participant_id, role, assumed_at, renounced_at \
             FROM participant_role \
             WHERE participant_id = $1 \
             ORDER BY assumed_at",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let roles = role_rows
            .iter()
            .map(|r| ParticipantRole {
                id: r.get("id"),
                participant_id: r.get("participant_id"),
                role: r.get("role"),
                assumed_at: r.get("assumed_at"),
                renounced_at: r.get("renounced_at"),
            })
            .collect();

        Ok(Some(ParticipantRead {
            id: participant.id,
            incident_id: participant.incident_id,
            case_id: participant.case_id,
            team: participant.team,
            department: participant.department,
            location: participant.location,
            added_reason: participant.added_reason,
            after_hours_notification: participant.after_hours_notification,
            individual,
            service,
            roles,
            created_at: participant.created_at,
        }))
    }

    async fn list(&self, subject: SubjectRef) -> Result<Vec<ParticipantReadMinimal>> {
        let sql = format!(
            "SELECT p.id, p.team, p.location, \
                    ic.id AS individual_id, ic.email, ic.name \
             FROM participant p \
             JOIN individual_contact ic ON ic.id = p.individual_contact_id \
             WHERE p.{column} = $1 \
             ORDER BY p.created_at",
            column = Self::subject_column(subject.kind),
        );

        let rows = sqlx::query(&sql)
            .bind(subject.id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut reads = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.get("id");
            let active_roles: Vec<String> = sqlx::query_scalar(
                "SELECT role FROM participant_role \
                 WHERE participant_id = $1 AND renounced_at IS NULL \
                 ORDER BY assumed_at",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            reads.push(ParticipantReadMinimal {
                id,
                team: row.get("team"),
                location: row.get("location"),
                individual: IndividualContactReadMinimal {
                    id: row.get("individual_id"),
                    email: row.get("email"),
                    name: row.get("name"),
                },
                active_roles,
            });
        }
        Ok(reads)
    }
}
