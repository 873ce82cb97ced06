//! In-memory mock repositories for deterministic testing.
//!
//! Each mock implements the corresponding caseflow-core trait over a
//! `Mutex<HashMap>` store, mirroring the storage semantics the flows rely
//! on (pair lookup, active-role filtering, write-once service binding,
//! full-replace association sets). Used by the service-level tests and
//! available to downstream consumers for their own tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use caseflow_core::{
    new_v7, Case, CaseRepository, ContactInfo, ContactPlugin, CreateEntityTypeRequest,
    CreateParticipantRequest, Definition, DefinitionRepository, Entity, EntityCreate, EntityScope,
    EntityType, EntityTypeRepository, Error, Incident, IncidentRepository, IndividualContact,
    IndividualContactReadMinimal, IndividualContactRepository, NotificationDispatcher,
    OncallService, OncallServiceReadMinimal, OncallServiceRepository, Participant,
    ParticipantRead, ParticipantReadMinimal, ParticipantRepository, ParticipantRole,
    ParticipantRoleCreate,
    ParticipantRoleRepository, Result, SignalInstance, SignalInstanceRepository, SubjectKind,
    SubjectRef, Term, TermRepository,
};
use chrono::Utc;
use uuid::Uuid;

// =============================================================================
// PARTICIPANTS
// =============================================================================

/// Shared in-memory store backing both the participant and the role mock
/// repositories, so role appends are visible through either. Holds a
/// reference to the [`MockDirectory`] so email-joined lookups and read
/// assembly resolve against the same individuals and services the tests
/// created.
pub struct MockParticipantStore {
    directory: Arc<MockDirectory>,
    pub participants: Mutex<HashMap<Uuid, Participant>>,
    pub roles: Mutex<HashMap<Uuid, ParticipantRole>>,
}

impl MockParticipantStore {
    pub fn new(directory: Arc<MockDirectory>) -> Arc<Self> {
        Arc::new(Self {
            directory,
            participants: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
        })
    }

    fn matches_subject(participant: &Participant, subject: SubjectRef) -> bool {
        match subject.kind {
            SubjectKind::Incident => participant.incident_id == Some(subject.id),
            SubjectKind::Case => participant.case_id == Some(subject.id),
        }
    }

    fn insert_role(&self, participant_id: Uuid, role: &str) -> ParticipantRole {
        let record = ParticipantRole {
            id: new_v7(),
            participant_id,
            role: role.to_string(),
            assumed_at: Utc::now(),
            renounced_at: None,
        };
        self.roles
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        record
    }

    pub fn roles_of(&self, participant_id: Uuid) -> Vec<ParticipantRole> {
        let mut roles: Vec<_> = self
            .roles
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.participant_id == participant_id)
            .cloned()
            .collect();
        roles.sort_by_key(|r| r.assumed_at);
        roles
    }
}

#[async_trait]
impl ParticipantRepository for MockParticipantStore {
    async fn get(&self, id: Uuid) -> Result<Option<Participant>> {
        Ok(self.participants.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_individual_contact_id(
        &self,
        individual_id: Uuid,
    ) -> Result<Vec<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.individual_contact_id == individual_id)
            .cloned()
            .collect())
    }

    async fn get_all_by_incident_id(&self, incident_id: Uuid) -> Result<Vec<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.incident_id == Some(incident_id))
            .cloned()
            .collect())
    }

    async fn get_all_by_case_id(&self, case_id: Uuid) -> Result<Vec<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.case_id == Some(case_id))
            .cloned()
            .collect())
    }

    async fn get_by_subject_and_individual(
        &self,
        subject: SubjectRef,
        individual_id: Uuid,
    ) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                MockParticipantStore::matches_subject(p, subject)
                    && p.individual_contact_id == individual_id
            })
            .cloned())
    }

    async fn get_by_incident_id_and_role(
        &self,
        incident_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_and_role(SubjectRef::incident(incident_id), role)
    }

    async fn get_by_case_id_and_role(
        &self,
        case_id: Uuid,
        role: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_and_role(SubjectRef::case(case_id), role)
    }

    async fn get_by_incident_id_and_email(
        &self,
        incident_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_and_email(SubjectRef::incident(incident_id), email)
    }

    async fn get_by_case_id_and_email(
        &self,
        case_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>> {
        self.get_by_subject_and_email(SubjectRef::case(case_id), email)
    }

    async fn get_by_incident_id_and_service_id(
        &self,
        incident_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .find(|p| p.incident_id == Some(incident_id) && p.service_id == Some(service_id))
            .cloned())
    }

    async fn get_by_case_id_and_service_id(
        &self,
        case_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .find(|p| p.case_id == Some(case_id) && p.service_id == Some(service_id))
            .cloned())
    }

    async fn get_by_incident_id_and_conversation_id(
        &self,
        incident_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                p.incident_id == Some(incident_id)
                    && p.user_conversation_id.as_deref() == Some(user_conversation_id)
            })
            .cloned())
    }

    async fn get_by_case_id_and_conversation_id(
        &self,
        case_id: Uuid,
        user_conversation_id: &str,
    ) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                p.case_id == Some(case_id)
                    && p.user_conversation_id.as_deref() == Some(user_conversation_id)
            })
            .cloned())
    }

    async fn create(&self, req: CreateParticipantRequest) -> Result<Participant> {
        let (incident_id, case_id) = match req.subject.kind {
            SubjectKind::Incident => (Some(req.subject.id), None),
            SubjectKind::Case => (None, Some(req.subject.id)),
        };

        let participant = Participant {
            id: new_v7(),
            incident_id,
            case_id,
            individual_contact_id: req.individual_contact_id,
            service_id: req.service_id,
            team: req.team,
            department: req.department,
            location: req.location,
            added_by_id: req.added_by_id,
            added_reason: req.added_reason,
            after_hours_notification: false,
            user_conversation_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        self.participants
            .lock()
            .unwrap()
            .insert(participant.id, participant.clone());
        for role in &req.roles {
            self.insert_role(participant.id, &role.role);
        }
        Ok(participant)
    }

    async fn create_all(
        &self,
        reqs: Vec<CreateParticipantRequest>,
    ) -> Result<Vec<Participant>> {
        let mut participants = Vec::with_capacity(reqs.len());
        for req in reqs {
            participants.push(ParticipantRepository::create(self, req).await?);
        }
        Ok(participants)
    }

    async fn update(
        &self,
        id: Uuid,
        req: caseflow_core::UpdateParticipantRequest,
    ) -> Result<Participant> {
        let mut participants = self.participants.lock().unwrap();
        let participant = participants
            .get_mut(&id)
            .ok_or(Error::ParticipantNotFound(id))?;

        if let Some(team) = req.team {
            participant.team = Some(team);
        }
        if let Some(department) = req.department {
            participant.department = Some(department);
        }
        if let Some(location) = req.location {
            participant.location = Some(location);
        }
        if let Some(added_reason) = req.added_reason {
            participant.added_reason = Some(added_reason);
        }
        if let Some(flag) = req.after_hours_notification {
            participant.after_hours_notification = flag;
        }
        if let Some(handle) = req.user_conversation_id {
            participant.user_conversation_id = Some(handle);
        }
        participant.updated_at = Utc::now();
        Ok(participant.clone())
    }

    async fn associate_service_once(&self, id: Uuid, service_id: Uuid) -> Result<bool> {
        let mut participants = self.participants.lock().unwrap();
        let participant = participants
            .get_mut(&id)
            .ok_or(Error::ParticipantNotFound(id))?;

        if participant.service_id.is_some() {
            return Ok(false);
        }
        participant.service_id = Some(service_id);
        participant.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.participants.lock().unwrap().remove(&id);
        self.roles
            .lock()
            .unwrap()
            .retain(|_, r| r.participant_id != id);
        Ok(())
    }

    async fn fetch_read(&self, id: Uuid) -> Result<Option<ParticipantRead>> {
        let Some(participant) = self.participants.lock().unwrap().get(&id).cloned() else {
            return Ok(None);
        };

        Ok(Some(ParticipantRead {
            id: participant.id,
            incident_id: participant.incident_id,
            case_id: participant.case_id,
            team: participant.team,
            department: participant.department,
            location: participant.location,
            added_reason: participant.added_reason,
            after_hours_notification: participant.after_hours_notification,
            individual: self.individual_minimal(participant.individual_contact_id),
            service: participant.service_id.and_then(|service_id| {
                self.directory
                    .services
                    .lock()
                    .unwrap()
                    .get(&service_id)
                    .map(OncallServiceReadMinimal::from)
            }),
            roles: self.roles_of(id),
            created_at: participant.created_at,
        }))
    }

    async fn list(&self, subject: SubjectRef) -> Result<Vec<ParticipantReadMinimal>> {
        let mut participants: Vec<Participant> = self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|p| Self::matches_subject(p, subject))
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.created_at);

        Ok(participants
            .into_iter()
            .map(|p| ParticipantReadMinimal {
                id: p.id,
                team: p.team,
                location: p.location,
                individual: self.individual_minimal(p.individual_contact_id),
                active_roles: self
                    .roles_of(p.id)
                    .into_iter()
                    .filter(|r| r.is_active())
                    .map(|r| r.role)
                    .collect(),
            })
            .collect())
    }
}

impl MockParticipantStore {
    fn get_by_subject_and_role(
        &self,
        subject: SubjectRef,
        role: &str,
    ) -> Result<Option<Participant>> {
        let roles = self.roles.lock().unwrap();
        let participants = self.participants.lock().unwrap();

        Ok(roles
            .values()
            .filter(|r| r.renounced_at.is_none() && r.role == role)
            .filter_map(|r| participants.get(&r.participant_id))
            .find(|p| Self::matches_subject(p, subject))
            .cloned())
    }

    fn get_by_subject_and_email(
        &self,
        subject: SubjectRef,
        email: &str,
    ) -> Result<Option<Participant>> {
        let individuals = self.directory.individuals.lock().unwrap();
        let participants = self.participants.lock().unwrap();

        Ok(participants
            .values()
            .filter(|p| Self::matches_subject(p, subject))
            .find(|p| {
                individuals
                    .get(&p.individual_contact_id)
                    .is_some_and(|i| i.email == email)
            })
            .cloned())
    }

    fn individual_minimal(&self, individual_id: Uuid) -> IndividualContactReadMinimal {
        self.directory
            .individuals
            .lock()
            .unwrap()
            .get(&individual_id)
            .map(IndividualContactReadMinimal::from)
            .unwrap_or(IndividualContactReadMinimal {
                id: individual_id,
                email: String::new(),
                name: None,
            })
    }
}

#[async_trait]
impl ParticipantRoleRepository for MockParticipantStore {
    async fn create(
        &self,
        participant_id: Uuid,
        req: ParticipantRoleCreate,
    ) -> Result<ParticipantRole> {
        Ok(self.insert_role(participant_id, &req.role))
    }

    async fn get_all_by_participant(&self, participant_id: Uuid) -> Result<Vec<ParticipantRole>> {
        Ok(self.roles_of(participant_id))
    }

    async fn get_active_roles(&self, participant_id: Uuid) -> Result<Vec<ParticipantRole>> {
        Ok(self
            .roles_of(participant_id)
            .into_iter()
            .filter(|r| r.renounced_at.is_none())
            .collect())
    }

    async fn renounce(&self, role_id: Uuid) -> Result<()> {
        let mut roles = self.roles.lock().unwrap();
        match roles.get_mut(&role_id) {
            Some(role) if role.renounced_at.is_none() => {
                role.renounced_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(Error::NotFound(format!(
                "Active participant role {} not found",
                role_id
            ))),
        }
    }
}

// =============================================================================
// SUBJECTS, INDIVIDUALS, SERVICES
// =============================================================================

#[derive(Default)]
pub struct MockDirectory {
    pub individuals: Mutex<HashMap<Uuid, IndividualContact>>,
    pub services: Mutex<HashMap<Uuid, OncallService>>,
    pub incidents: Mutex<HashMap<Uuid, Incident>>,
    pub cases: Mutex<HashMap<Uuid, Case>>,
}

impl MockDirectory {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn add_individual(&self, project_id: Uuid, email: &str) -> IndividualContact {
        let individual = IndividualContact {
            id: new_v7(),
            project_id,
            email: email.to_string(),
            name: None,
            created_at: Utc::now(),
        };
        self.individuals
            .lock()
            .unwrap()
            .insert(individual.id, individual.clone());
        individual
    }

    pub fn add_service(&self, project_id: Uuid, name: &str) -> OncallService {
        let service = OncallService {
            id: new_v7(),
            project_id,
            external_id: None,
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.services
            .lock()
            .unwrap()
            .insert(service.id, service.clone());
        service
    }

    pub fn add_incident(&self, project_id: Uuid, name: &str) -> Incident {
        let incident = Incident {
            id: new_v7(),
            project_id,
            name: name.to_string(),
            title: None,
            created_at: Utc::now(),
        };
        self.incidents
            .lock()
            .unwrap()
            .insert(incident.id, incident.clone());
        incident
    }

    pub fn add_case(&self, project_id: Uuid, name: &str) -> Case {
        let case = Case {
            id: new_v7(),
            project_id,
            name: name.to_string(),
            title: None,
            created_at: Utc::now(),
        };
        self.cases.lock().unwrap().insert(case.id, case.clone());
        case
    }
}

#[async_trait]
impl IndividualContactRepository for MockDirectory {
    async fn get(&self, id: Uuid) -> Result<Option<IndividualContact>> {
        Ok(self.individuals.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(
        &self,
        project_id: Uuid,
        email: &str,
    ) -> Result<Option<IndividualContact>> {
        Ok(self
            .individuals
            .lock()
            .unwrap()
            .values()
            .find(|i| i.project_id == project_id && i.email == email)
            .cloned())
    }

    async fn create(
        &self,
        project_id: Uuid,
        email: &str,
        name: Option<&str>,
    ) -> Result<IndividualContact> {
        let mut individual = self.add_individual(project_id, email);
        individual.name = name.map(String::from);
        self.individuals
            .lock()
            .unwrap()
            .insert(individual.id, individual.clone());
        Ok(individual)
    }
}

#[async_trait]
impl OncallServiceRepository for MockDirectory {
    async fn get(&self, id: Uuid) -> Result<Option<OncallService>> {
        Ok(self.services.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_external_id(
        &self,
        project_id: Uuid,
        external_id: &str,
    ) -> Result<Option<OncallService>> {
        Ok(self
            .services
            .lock()
            .unwrap()
            .values()
            .find(|s| s.project_id == project_id && s.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn create(
        &self,
        project_id: Uuid,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<OncallService> {
        let mut service = self.add_service(project_id, name);
        service.external_id = external_id.map(String::from);
        self.services
            .lock()
            .unwrap()
            .insert(service.id, service.clone());
        Ok(service)
    }
}

#[async_trait]
impl IncidentRepository for MockDirectory {
    async fn get(&self, id: Uuid) -> Result<Option<Incident>> {
        Ok(self.incidents.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, project_id: Uuid, name: &str, _title: Option<&str>) -> Result<Incident> {
        Ok(self.add_incident(project_id, name))
    }
}

#[async_trait]
impl CaseRepository for MockDirectory {
    async fn get(&self, id: Uuid) -> Result<Option<Case>> {
        Ok(self.cases.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, project_id: Uuid, name: &str, _title: Option<&str>) -> Result<Case> {
        Ok(self.add_case(project_id, name))
    }
}

// =============================================================================
// VOCABULARY
// =============================================================================

#[derive(Default)]
pub struct MockVocabulary {
    pub terms: Mutex<HashMap<Uuid, Term>>,
    pub definitions: Mutex<HashMap<Uuid, Definition>>,
    pub term_definitions: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    pub definition_teams: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl MockVocabulary {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }
}

#[async_trait]
impl TermRepository for MockVocabulary {
    async fn get(&self, id: Uuid) -> Result<Option<Term>> {
        Ok(self.terms.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_text(&self, project_id: Uuid, text: &str) -> Result<Option<Term>> {
        Ok(self
            .terms
            .lock()
            .unwrap()
            .values()
            .find(|t| t.project_id == project_id && t.text == text)
            .cloned())
    }

    async fn get_all(&self, project_id: Uuid) -> Result<Vec<Term>> {
        Ok(self
            .terms
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn create(&self, project_id: Uuid, text: &str, discoverable: bool) -> Result<Term> {
        let term = Term {
            id: new_v7(),
            project_id,
            text: text.to_string(),
            discoverable,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.terms.lock().unwrap().insert(term.id, term.clone());
        Ok(term)
    }

    async fn update_base(&self, id: Uuid, discoverable: Option<bool>) -> Result<Term> {
        let mut terms = self.terms.lock().unwrap();
        let term = terms.get_mut(&id).ok_or(Error::TermNotFound(id))?;
        if let Some(discoverable) = discoverable {
            term.discoverable = discoverable;
        }
        term.updated_at = Utc::now();
        Ok(term.clone())
    }

    async fn set_definitions(&self, term_id: Uuid, definition_ids: &[Uuid]) -> Result<()> {
        self.term_definitions
            .lock()
            .unwrap()
            .insert(term_id, definition_ids.to_vec());
        Ok(())
    }

    async fn get_definitions(&self, term_id: Uuid) -> Result<Vec<Definition>> {
        let associations = self.term_definitions.lock().unwrap();
        let definitions = self.definitions.lock().unwrap();
        Ok(associations
            .get(&term_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| definitions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.terms.lock().unwrap().remove(&id);
        self.term_definitions.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl DefinitionRepository for MockVocabulary {
    async fn get(&self, id: Uuid) -> Result<Option<Definition>> {
        Ok(self.definitions.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_text(&self, project_id: Uuid, text: &str) -> Result<Option<Definition>> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .values()
            .find(|d| d.project_id == project_id && d.text == text)
            .cloned())
    }

    async fn create(
        &self,
        project_id: Uuid,
        text: &str,
        source: Option<&str>,
    ) -> Result<Definition> {
        let definition = Definition {
            id: new_v7(),
            project_id,
            text: text.to_string(),
            source: source.unwrap_or(caseflow_core::defaults::DEFINITION_SOURCE).to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.definitions
            .lock()
            .unwrap()
            .insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn update_source(&self, id: Uuid, source: &str) -> Result<Definition> {
        let mut definitions = self.definitions.lock().unwrap();
        let definition = definitions
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Definition {} not found", id)))?;
        definition.source = source.to_string();
        definition.updated_at = Utc::now();
        Ok(definition.clone())
    }

    async fn set_teams(&self, definition_id: Uuid, team_ids: &[Uuid]) -> Result<()> {
        self.definition_teams
            .lock()
            .unwrap()
            .insert(definition_id, team_ids.to_vec());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.definitions.lock().unwrap().remove(&id);
        self.definition_teams.lock().unwrap().remove(&id);
        Ok(())
    }
}

// =============================================================================
// ENTITY TYPES AND SIGNAL INSTANCES
// =============================================================================

#[derive(Default)]
pub struct MockSignalStore {
    pub entity_types: Mutex<HashMap<Uuid, EntityType>>,
    pub signal_associations: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    pub instances: Mutex<HashMap<Uuid, SignalInstance>>,
    pub instance_entities: Mutex<HashMap<Uuid, Vec<Entity>>>,
}

impl MockSignalStore {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn add_instance(
        &self,
        signal_id: Uuid,
        project_id: Uuid,
        case_id: Option<Uuid>,
        raw: serde_json::Value,
    ) -> SignalInstance {
        let instance = SignalInstance {
            id: new_v7(),
            signal_id,
            case_id,
            project_id,
            raw,
            created_at: Utc::now(),
        };
        self.instances
            .lock()
            .unwrap()
            .insert(instance.id, instance.clone());
        instance
    }
}

#[async_trait]
impl EntityTypeRepository for MockSignalStore {
    async fn get(&self, id: Uuid) -> Result<Option<EntityType>> {
        Ok(self.entity_types.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(
        &self,
        project_id: Uuid,
        scope: Option<EntityScope>,
    ) -> Result<Vec<EntityType>> {
        Ok(self
            .entity_types
            .lock()
            .unwrap()
            .values()
            .filter(|et| et.project_id == project_id)
            .filter(|et| scope.map_or(true, |s| et.scope == s))
            .cloned()
            .collect())
    }

    async fn get_for_signal(&self, signal_id: Uuid) -> Result<Vec<EntityType>> {
        let associations = self.signal_associations.lock().unwrap();
        let entity_types = self.entity_types.lock().unwrap();
        Ok(associations
            .get(&signal_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| entity_types.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, req: CreateEntityTypeRequest) -> Result<EntityType> {
        let entity_type = EntityType {
            id: new_v7(),
            project_id: req.project_id,
            name: req.name,
            description: req.description,
            scope: req.scope,
            regular_expression: req.regular_expression,
            jpath: req.jpath,
            enabled: req.enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.entity_types
            .lock()
            .unwrap()
            .insert(entity_type.id, entity_type.clone());
        Ok(entity_type)
    }

    async fn associate_with_signal(&self, entity_type_id: Uuid, signal_id: Uuid) -> Result<()> {
        let mut associations = self.signal_associations.lock().unwrap();
        let ids = associations.entry(signal_id).or_default();
        if !ids.contains(&entity_type_id) {
            ids.push(entity_type_id);
        }
        Ok(())
    }
}

#[async_trait]
impl SignalInstanceRepository for MockSignalStore {
    async fn get(&self, id: Uuid) -> Result<Option<SignalInstance>> {
        Ok(self.instances.lock().unwrap().get(&id).cloned())
    }

    async fn create(
        &self,
        signal_id: Uuid,
        project_id: Uuid,
        case_id: Option<Uuid>,
        raw: serde_json::Value,
    ) -> Result<SignalInstance> {
        Ok(self.add_instance(signal_id, project_id, case_id, raw))
    }

    async fn replace_entities(&self, instance_id: Uuid, entities: &[EntityCreate]) -> Result<()> {
        let project_id = self
            .instances
            .lock()
            .unwrap()
            .get(&instance_id)
            .map(|i| i.project_id)
            .ok_or(Error::SignalInstanceNotFound(instance_id))?;

        let materialized = entities
            .iter()
            .map(|e| Entity {
                id: new_v7(),
                project_id,
                entity_type_id: e.entity_type_id,
                value: e.value.clone(),
                created_at: Utc::now(),
            })
            .collect();

        self.instance_entities
            .lock()
            .unwrap()
            .insert(instance_id, materialized);
        Ok(())
    }

    async fn get_entities(&self, instance_id: Uuid) -> Result<Vec<Entity>> {
        Ok(self
            .instance_entities
            .lock()
            .unwrap()
            .get(&instance_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Contact plugin returning a fixed response, with an optional failure mode.
pub struct MockContactPlugin {
    info: ContactInfo,
    fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockContactPlugin {
    pub fn returning(info: ContactInfo) -> Self {
        Self {
            info,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            info: ContactInfo::default(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContactPlugin for MockContactPlugin {
    async fn get(&self, email: &str) -> Result<ContactInfo> {
        self.calls.lock().unwrap().push(email.to_string());
        if self.fail {
            return Err(Error::Plugin("mock contact plugin failure".to_string()));
        }
        Ok(self.info.clone())
    }
}

/// Dispatcher that records every notification, optionally failing each one.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub fail: bool,
    pub sent: Mutex<Vec<(Uuid, Uuid)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send_entity_update_notification(
        &self,
        entity_type: &EntityType,
        case: &Case,
    ) -> Result<()> {
        self.sent.lock().unwrap().push((entity_type.id, case.id));
        if self.fail {
            return Err(Error::Notification(
                "mock dispatcher failure".to_string(),
            ));
        }
        Ok(())
    }
}
