//! # caseflow-db
//!
//! PostgreSQL database layer for caseflow.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - A combined [`Database`] context bundling the repositories
//!
//! ## Example
//!
//! ```rust,ignore
//! use caseflow_db::Database;
//! use caseflow_core::{ParticipantRepository, SubjectRef};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/caseflow").await?;
//!
//!     let participant = db
//!         .participants
//!         .get_by_incident_id_and_role(incident_id, "Incident Commander")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod definitions;
pub mod entity_types;
pub mod individuals;
pub mod oncall_services;
pub mod participant_roles;
pub mod participants;
pub mod pool;
pub mod signal_instances;
pub mod subjects;
pub mod terms;

// Test fixtures for integration tests.
// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL.
pub mod test_fixtures;

// Re-export core types
pub use caseflow_core::*;

// Re-export repository implementations
pub use definitions::PgDefinitionRepository;
pub use entity_types::PgEntityTypeRepository;
pub use individuals::PgIndividualContactRepository;
pub use oncall_services::PgOncallServiceRepository;
pub use participant_roles::PgParticipantRoleRepository;
pub use participants::PgParticipantRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use signal_instances::PgSignalInstanceRepository;
pub use subjects::{PgCaseRepository, PgIncidentRepository};
pub use terms::PgTermRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Participant repository with subject-scoped lookups.
    pub participants: PgParticipantRepository,
    /// Participant role repository.
    pub participant_roles: PgParticipantRoleRepository,
    /// Individual contact repository.
    pub individuals: PgIndividualContactRepository,
    /// On-call service repository.
    pub oncall_services: PgOncallServiceRepository,
    /// Incident repository.
    pub incidents: PgIncidentRepository,
    /// Case repository.
    pub cases: PgCaseRepository,
    /// Term repository.
    pub terms: PgTermRepository,
    /// Definition repository.
    pub definitions: PgDefinitionRepository,
    /// Entity type repository.
    pub entity_types: PgEntityTypeRepository,
    /// Signal instance repository.
    pub signal_instances: PgSignalInstanceRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            participants: PgParticipantRepository::new(pool.clone()),
            participant_roles: PgParticipantRoleRepository::new(pool.clone()),
            individuals: PgIndividualContactRepository::new(pool.clone()),
            oncall_services: PgOncallServiceRepository::new(pool.clone()),
            incidents: PgIncidentRepository::new(pool.clone()),
            cases: PgCaseRepository::new(pool.clone()),
            terms: PgTermRepository::new(pool.clone()),
            definitions: PgDefinitionRepository::new(pool.clone()),
            entity_types: PgEntityTypeRepository::new(pool.clone()),
            signal_instances: PgSignalInstanceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
