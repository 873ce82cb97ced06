//! Core traits for caseflow abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy. The database crate provides PostgreSQL implementations; the
//! service crate ships in-memory mocks for deterministic tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// PARTICIPANT REPOSITORY
// =============================================================================

/// Repository for participant records and their subject-scoped lookups.
///
/// Every lookup is a pure read: absence is `Ok(None)` or an empty vec,
/// never an error.
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Fetch a participant by id.
    async fn get(&self, id: Uuid) -> Result<Option<Participant>>;

    /// All participants for a given individual contact, across subjects.
    async fn get_by_individual_contact_id(&self, individual_id: Uuid)
        -> Result<Vec<Participant>>;

    /// All participants of an incident.
    async fn get_all_by_incident_id(&self, incident_id: Uuid) -> Result<Vec<Participant>>;

    /// All participants of a case.
    async fn get_all_by_case_id(&self, case_id: Uuid) -> Result<Vec<Participant>>;

    /// The canonical participant for a (subject, individual) pair, if any.
    async fn get_by_subject_and_individual(
        &self,
        subject: SubjectRef,
        individual_id: Uuid,
    ) -> Result<Option<Participant>>;

    /// The participant holding the given role on an incident.
    /// Only active (non-renounced) roles match.
    async fn get_by_incident_id_and_role(
        &self,
        incident_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>>;

    /// The participant holding the given role on a case.
    /// Only active (non-renounced) roles match.
    async fn get_by_case_id_and_role(
        &self,
        case_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>>;

    /// The incident participant whose individual has the given email.
    async fn get_by_incident_id_and_email(
        &self,
        incident_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>>;

    /// The case participant whose individual has the given email.
    async fn get_by_case_id_and_email(
        &self,
        case_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>>;

    /// First incident participant bound to the given service, if any.
    /// Multiple matches are not an error; the first wins.
    async fn get_by_incident_id_and_service_id(
        &self,
        incident_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>>;

    /// First case participant bound to the given service, if any.
    async fn get_by_case_id_and_service_id(
        &self,
        case_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>>;

    /// The incident participant with the given external conversation handle.
    async fn get_by_incident_id_and_conversation_id(
        &self,
        incident_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>>;

    /// The case participant with the given external conversation handle.
    async fn get_by_case_id_and_conversation_id(
        &self,
        case_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>>;

    /// Insert a participant together with its initial roles.
    async fn create(&self, req: CreateParticipantRequest) -> Result<Participant>;

    /// Bulk insert participants (no roles).
    async fn create_all(&self, reqs: Vec<CreateParticipantRequest>) -> Result<Vec<Participant>>;

    /// Update base fields; only provided fields change.
    async fn update(&self, id: Uuid, req: UpdateParticipantRequest) -> Result<Participant>;

    /// Bind a service to a participant only if none is bound yet.
    ///
    /// Write-once by contract: returns `true` when the binding was applied,
    /// `false` when the participant already had a service (the call is then
    /// a silent no-op, preserving the established binding).
    async fn associate_service_once(&self, id: Uuid, service_id: Uuid) -> Result<bool>;

    /// Delete a participant; owned roles and feedback cascade.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Assemble the full read representation with nested associations.
    async fn fetch_read(&self, id: Uuid) -> Result<Option<ParticipantRead>>;

    /// Minimal reads for every participant of a subject, with active role
    /// names resolved. The shape list endpoints return.
    async fn list(&self, subject: SubjectRef) -> Result<Vec<ParticipantReadMinimal>>;
}

/// Repository for participant role records.
#[async_trait]
pub trait ParticipantRoleRepository: Send + Sync {
    /// Append a role record to a participant. Role creation is
    /// unconditional: repeated assignments of the same role name produce
    /// distinct historical records.
    async fn create(&self, participant_id: Uuid, req: ParticipantRoleCreate)
        -> Result<ParticipantRole>;

    /// All role records for a participant, active and renounced.
    async fn get_all_by_participant(&self, participant_id: Uuid) -> Result<Vec<ParticipantRole>>;

    /// Active (non-renounced) role records for a participant.
    async fn get_active_roles(&self, participant_id: Uuid) -> Result<Vec<ParticipantRole>>;

    /// Stamp a role's renounced timestamp, ending it.
    async fn renounce(&self, role_id: Uuid) -> Result<()>;
}

// =============================================================================
// SUBJECT AND CONTACT REPOSITORIES
// =============================================================================

/// Repository for individual contacts.
#[async_trait]
pub trait IndividualContactRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<IndividualContact>>;

    async fn get_by_email(&self, project_id: Uuid, email: &str)
        -> Result<Option<IndividualContact>>;

    async fn create(&self, project_id: Uuid, email: &str, name: Option<&str>)
        -> Result<IndividualContact>;
}

/// Repository for on-call services.
#[async_trait]
pub trait OncallServiceRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<OncallService>>;

    async fn get_by_external_id(
        &self,
        project_id: Uuid,
        external_id: &str,
    ) -> Result<Option<OncallService>>;

    async fn create(
        &self,
        project_id: Uuid,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<OncallService>;
}

/// Repository for incidents. Fixture-grade: only what subject resolution
/// and tests need.
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Incident>>;

    async fn create(&self, project_id: Uuid, name: &str, title: Option<&str>) -> Result<Incident>;
}

/// Repository for cases. Fixture-grade counterpart of [`IncidentRepository`].
#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Case>>;

    async fn create(&self, project_id: Uuid, name: &str, title: Option<&str>) -> Result<Case>;
}

// =============================================================================
// VOCABULARY REPOSITORIES
// =============================================================================

/// Repository for controlled-vocabulary terms.
///
/// Primitive operations only; the upsert policy (find-by-unique-key then
/// update-or-create, full replacement of definition associations) lives in
/// the service layer so it can be exercised against mocks.
#[async_trait]
pub trait TermRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Term>>;

    async fn get_by_text(&self, project_id: Uuid, text: &str) -> Result<Option<Term>>;

    async fn get_all(&self, project_id: Uuid) -> Result<Vec<Term>>;

    async fn create(&self, project_id: Uuid, text: &str, discoverable: bool) -> Result<Term>;

    async fn update_base(&self, id: Uuid, discoverable: Option<bool>) -> Result<Term>;

    /// Replace the term's definition association set with exactly the
    /// given definition ids.
    async fn set_definitions(&self, term_id: Uuid, definition_ids: &[Uuid]) -> Result<()>;

    /// Definitions currently associated with the term.
    async fn get_definitions(&self, term_id: Uuid) -> Result<Vec<Definition>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Repository for definitions (unique per (project, text)).
#[async_trait]
pub trait DefinitionRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Definition>>;

    async fn get_by_text(&self, project_id: Uuid, text: &str) -> Result<Option<Definition>>;

    async fn create(&self, project_id: Uuid, text: &str, source: Option<&str>)
        -> Result<Definition>;

    async fn update_source(&self, id: Uuid, source: &str) -> Result<Definition>;

    /// Replace the definition's team association set.
    async fn set_teams(&self, definition_id: Uuid, team_ids: &[Uuid]) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// ENTITY TYPE AND SIGNAL REPOSITORIES
// =============================================================================

/// Repository for entity types.
#[async_trait]
pub trait EntityTypeRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<EntityType>>;

    /// All entity types for a project, optionally filtered by scope.
    async fn get_all(&self, project_id: Uuid, scope: Option<EntityScope>)
        -> Result<Vec<EntityType>>;

    /// Entity types associated with a signal definition.
    async fn get_for_signal(&self, signal_id: Uuid) -> Result<Vec<EntityType>>;

    async fn create(&self, req: CreateEntityTypeRequest) -> Result<EntityType>;

    /// Associate an entity type with a signal definition.
    async fn associate_with_signal(&self, entity_type_id: Uuid, signal_id: Uuid) -> Result<()>;
}

/// Repository for signal instances and their extracted entity sets.
#[async_trait]
pub trait SignalInstanceRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<SignalInstance>>;

    async fn create(
        &self,
        signal_id: Uuid,
        project_id: Uuid,
        case_id: Option<Uuid>,
        raw: serde_json::Value,
    ) -> Result<SignalInstance>;

    /// Replace the instance's extracted entity set. Entities are upserted
    /// by (project, type, value); prior associations for the instance are
    /// dropped.
    async fn replace_entities(&self, instance_id: Uuid, entities: &[EntityCreate]) -> Result<()>;

    /// Entities currently associated with the instance.
    async fn get_entities(&self, instance_id: Uuid) -> Result<Vec<Entity>>;
}

// =============================================================================
// CAPABILITY CONTRACTS
// =============================================================================

/// Contact enrichment capability: supplies organizational metadata for an
/// individual. Resolved dynamically per project; absence is a valid,
/// handled state.
#[async_trait]
pub trait ContactPlugin: Send + Sync {
    async fn get(&self, email: &str) -> Result<ContactInfo>;
}

/// Best-effort notification side channel. Callers fire and forget: a
/// failure is logged by the flow that invoked it, never propagated.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_entity_update_notification(
        &self,
        entity_type: &EntityType,
        case: &Case,
    ) -> Result<()>;
}
