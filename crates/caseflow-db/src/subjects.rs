//! PostgreSQL implementations of IncidentRepository and CaseRepository.
//!
//! Deliberately minimal: the resolver only needs to load a subject record
//! to reach its owning project, and tests need to create them.

use async_trait::async_trait;
use caseflow_core::{new_v7, Case, CaseRepository, Error, Incident, IncidentRepository, Result};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

pub struct PgIncidentRepository {
    pool: Pool<Postgres>,
}

impl PgIncidentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentRepository for PgIncidentRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Incident>> {
        let row = sqlx::query(
            "SELECT id, project_id, name, title, created_at FROM incident WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Incident {
            id: r.get("id"),
            project_id: r.get("project_id"),
            name: r.get("name"),
            title: r.get("title"),
            created_at: r.get("created_at"),
        }))
    }

    async fn create(&self, project_id: Uuid, name: &str, title: Option<&str>) -> Result<Incident> {
        let row = sqlx::query(
            "INSERT INTO incident (id, project_id, name, title) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, name, title, created_at",
        )
        .bind(new_v7())
        .bind(project_id)
        .bind(name)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Incident {
            id: row.get("id"),
            project_id: row.get("project_id"),
            name: row.get("name"),
            title: row.get("title"),
            created_at: row.get("created_at"),
        })
    }
}

pub struct PgCaseRepository {
    pool: Pool<Postgres>,
}

impl PgCaseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseRepository for PgCaseRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Case>> {
        let row = sqlx::query(
            "SELECT id, project_id, name, title, created_at FROM case_record WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Case {
            id: r.get("id"),
            project_id: r.get("project_id"),
            name: r.get("name"),
            title: r.get("title"),
            created_at: r.get("created_at"),
        }))
    }

    async fn create(&self, project_id: Uuid, name: &str, title: Option<&str>) -> Result<Case> {
        let row = sqlx::query(
            "INSERT INTO case_record (id, project_id, name, title) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, name, title, created_at",
        )
        .bind(new_v7())
        .bind(project_id)
        .bind(name)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Case {
            id: row.get("id"),
            project_id: row.get("project_id"),
            name: row.get("name"),
            title: row.get("title"),
            created_at: row.get("created_at"),
        })
    }
}
