//! Core data models for caseflow.
//!
//! Database row models carry every column; `*Read` variants are the shapes
//! returned to callers (write-only/internal fields omitted, nested minimal
//! representations to bound response size); `*Create`/`*Update` variants are
//! the shapes accepted from callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// SUBJECTS
// =============================================================================

/// The kind of parent entity a participant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Incident,
    Case,
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incident => write!(f, "incident"),
            Self::Case => write!(f, "case"),
        }
    }
}

impl std::str::FromStr for SubjectKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incident" => Ok(Self::Incident),
            "case" => Ok(Self::Case),
            _ => Err(format!("Invalid subject kind: {}", s)),
        }
    }
}

/// A reference to a participant's parent entity: an incident XOR a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: Uuid,
}

impl SubjectRef {
    pub fn incident(id: Uuid) -> Self {
        Self {
            kind: SubjectKind::Incident,
            id,
        }
    }

    pub fn case(id: Uuid) -> Self {
        Self {
            kind: SubjectKind::Case,
            id,
        }
    }
}

/// Minimal incident record: only what subject resolution needs.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Incident {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal case record: only what subject resolution needs.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Case {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// INDIVIDUALS AND ONCALL SERVICES
// =============================================================================

/// A person who can participate in incidents and cases.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct IndividualContact {
    pub id: Uuid,
    pub project_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Nested minimal representation of an individual contact.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct IndividualContactReadMinimal {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<&IndividualContact> for IndividualContactReadMinimal {
    fn from(individual: &IndividualContact) -> Self {
        Self {
            id: individual.id,
            email: individual.email.clone(),
            name: individual.name.clone(),
        }
    }
}

/// An on-call service that a participant may be paged through.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OncallService {
    pub id: Uuid,
    pub project_id: Uuid,
    pub external_id: Option<String>,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Nested minimal representation of an on-call service.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OncallServiceReadMinimal {
    pub id: Uuid,
    pub name: String,
}

impl From<&OncallService> for OncallServiceReadMinimal {
    fn from(service: &OncallService) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
        }
    }
}

// =============================================================================
// PARTICIPANTS
// =============================================================================

/// One person's involvement in exactly one subject (incident XOR case).
///
/// Flat row model; `incident_id` and `case_id` are mutually exclusive
/// (CHECK constraint in storage). `added_by_id` is a non-owning self
/// reference to the participant who added this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub incident_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub individual_contact_id: Uuid,
    pub service_id: Option<Uuid>,
    pub team: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub added_by_id: Option<Uuid>,
    pub added_reason: Option<String>,
    pub after_hours_notification: bool,
    pub user_conversation_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// The subject this participant belongs to.
    pub fn subject(&self) -> Option<SubjectRef> {
        match (self.incident_id, self.case_id) {
            (Some(id), None) => Some(SubjectRef::incident(id)),
            (None, Some(id)) => Some(SubjectRef::case(id)),
            _ => None,
        }
    }
}

/// A named capability held by a participant over a time interval.
///
/// `renounced_at == None` means the role is still active. A participant may
/// hold several roles at once, including repeated historical records of the
/// same role name.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ParticipantRole {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub role: String,
    pub assumed_at: DateTime<Utc>,
    pub renounced_at: Option<DateTime<Utc>>,
}

impl ParticipantRole {
    pub fn is_active(&self) -> bool {
        self.renounced_at.is_none()
    }
}

/// Role specification supplied when creating or enriching a participant.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ParticipantRoleCreate {
    pub role: String,
}

impl ParticipantRoleCreate {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

/// Request for creating a new participant.
#[derive(Debug, Clone)]
pub struct CreateParticipantRequest {
    pub subject: SubjectRef,
    pub individual_contact_id: Uuid,
    pub service_id: Option<Uuid>,
    pub team: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub added_by_id: Option<Uuid>,
    pub added_reason: Option<String>,
    pub roles: Vec<ParticipantRoleCreate>,
}

/// Request for updating a participant's base fields.
///
/// Only provided fields are changed; role and service associations are
/// managed by their own operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateParticipantRequest {
    pub team: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub added_reason: Option<String>,
    pub after_hours_notification: Option<bool>,
    pub user_conversation_id: Option<String>,
}

/// Full read representation of a participant with nested associations.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ParticipantRead {
    pub id: Uuid,
    pub incident_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub team: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub added_reason: Option<String>,
    pub after_hours_notification: bool,
    pub individual: IndividualContactReadMinimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<OncallServiceReadMinimal>,
    pub roles: Vec<ParticipantRole>,
    pub created_at: DateTime<Utc>,
}

/// Minimal read representation for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ParticipantReadMinimal {
    pub id: Uuid,
    pub team: Option<String>,
    pub location: Option<String>,
    pub individual: IndividualContactReadMinimal,
    pub active_roles: Vec<String>,
}

// =============================================================================
// CONTACT ENRICHMENT
// =============================================================================

/// Organizational metadata supplied by a contact enrichment plugin.
///
/// Every field is optional; the resolver substitutes defaults for anything
/// the plugin could not provide.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContactInfo {
    pub location: Option<String>,
    pub team: Option<String>,
    pub department: Option<String>,
}

// =============================================================================
// TERMS AND DEFINITIONS
// =============================================================================

/// A controlled-vocabulary term, unique per (project, text).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Term {
    pub id: Uuid,
    pub project_id: Uuid,
    pub text: String,
    pub discoverable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating (or upserting) a term.
#[derive(Debug, Clone)]
pub struct TermCreate {
    /// When set, `get_or_create` matches on the explicit id first.
    pub id: Option<Uuid>,
    pub project_id: Uuid,
    pub text: String,
    pub discoverable: bool,
    pub definitions: Vec<DefinitionCreate>,
}

/// Request for updating a term. The definition list is a full replacement
/// of the association set, not a merge.
#[derive(Debug, Clone)]
pub struct TermUpdate {
    pub discoverable: Option<bool>,
    pub definitions: Vec<DefinitionCreate>,
}

/// Term with its associated definitions resolved.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TermRead {
    pub id: Uuid,
    pub text: String,
    pub discoverable: bool,
    pub definitions: Vec<Definition>,
}

/// A definition, unique per (project, text), shared across terms.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Definition {
    pub id: Uuid,
    pub project_id: Uuid,
    pub text: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating (or upserting) a definition.
#[derive(Debug, Clone)]
pub struct DefinitionCreate {
    pub project_id: Uuid,
    pub text: String,
    pub source: Option<String>,
    /// Team contacts associated with this definition (full set on upsert).
    pub team_ids: Vec<Uuid>,
}

// =============================================================================
// ENTITY TYPES, SIGNALS, ENTITIES
// =============================================================================

/// How broadly an entity type applies during extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityScope {
    /// Applies to every signal in the project.
    All,
    /// Applies to a single signal definition.
    #[default]
    Single,
    /// Applies to an explicit subset of signal definitions.
    Multiple,
}

impl std::fmt::Display for EntityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Single => write!(f, "single"),
            Self::Multiple => write!(f, "multiple"),
        }
    }
}

impl std::str::FromStr for EntityScope {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            _ => Err(format!("Invalid entity scope: {}", s)),
        }
    }
}

/// A classification used to extract structured entities from signal
/// instances.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EntityType {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub scope: EntityScope,
    /// Optional regex applied to the selected field; the first capture
    /// group (or whole match) becomes the entity value.
    pub regular_expression: Option<String>,
    /// Optional dot-separated path selecting a field of the raw payload.
    pub jpath: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating an entity type.
#[derive(Debug, Clone)]
pub struct CreateEntityTypeRequest {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub scope: EntityScope,
    pub regular_expression: Option<String>,
    pub jpath: Option<String>,
    pub enabled: bool,
}

/// An extracted structured value, unique per (project, type, value).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Entity {
    pub id: Uuid,
    pub project_id: Uuid,
    pub entity_type_id: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// A value extracted from a signal instance, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCreate {
    pub entity_type_id: Uuid,
    pub value: String,
}

/// An event record against which entity extraction is run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalInstance {
    pub id: Uuid,
    pub signal_id: Uuid,
    pub case_id: Option<Uuid>,
    pub project_id: Uuid,
    pub raw: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_subject_kind_display_roundtrip() {
        for kind in [SubjectKind::Incident, SubjectKind::Case] {
            let parsed = SubjectKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_subject_kind_rejects_unknown() {
        assert!(SubjectKind::from_str("escalation").is_err());
    }

    #[test]
    fn test_entity_scope_display_roundtrip() {
        for scope in [EntityScope::All, EntityScope::Single, EntityScope::Multiple] {
            let parsed = EntityScope::from_str(&scope.to_string()).unwrap();
            assert_eq!(parsed, scope);
        }
    }

    #[test]
    fn test_entity_scope_default_is_single() {
        assert_eq!(EntityScope::default(), EntityScope::Single);
    }

    #[test]
    fn test_entity_scope_serde_lowercase() {
        let json = serde_json::to_string(&EntityScope::All).unwrap();
        assert_eq!(json, "\"all\"");
        let parsed: EntityScope = serde_json::from_str("\"multiple\"").unwrap();
        assert_eq!(parsed, EntityScope::Multiple);
    }

    #[test]
    fn test_participant_subject_incident() {
        let incident_id = Uuid::new_v4();
        let participant = Participant {
            id: Uuid::new_v4(),
            incident_id: Some(incident_id),
            case_id: None,
            individual_contact_id: Uuid::new_v4(),
            service_id: None,
            team: None,
            department: None,
            location: None,
            added_by_id: None,
            added_reason: None,
            after_hours_notification: false,
            user_conversation_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            participant.subject(),
            Some(SubjectRef::incident(incident_id))
        );
    }

    #[test]
    fn test_participant_role_is_active() {
        let mut role = ParticipantRole {
            id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
            role: "Incident Commander".to_string(),
            assumed_at: Utc::now(),
            renounced_at: None,
        };
        assert!(role.is_active());
        role.renounced_at = Some(Utc::now());
        assert!(!role.is_active());
    }

    #[test]
    fn test_contact_info_default_is_empty() {
        let info = ContactInfo::default();
        assert!(info.location.is_none());
        assert!(info.team.is_none());
        assert!(info.department.is_none());
    }
}
