//! Participant de-duplication and enrichment.
//!
//! Given a (subject, individual) pair, [`ParticipantResolver::get_or_create`]
//! finds or creates the single canonical participant record, enriching it
//! with role and service associations without duplicating existing state.
//!
//! Pair uniqueness is backed by a storage constraint: when two callers race
//! on the same pair, the loser's insert fails with a unique violation and
//! is retried as a lookup, so both callers converge on one record.

use std::sync::Arc;
use std::time::Instant;

use caseflow_core::{
    defaults, CaseRepository, ContactInfo, CreateParticipantRequest, Error,
    IncidentRepository, IndividualContact, IndividualContactRepository, OncallServiceRepository,
    Participant, ParticipantRepository, ParticipantRoleCreate, ParticipantRoleRepository, Result,
    SubjectKind, SubjectRef,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::plugins::PluginRegistry;

/// Resolves (subject, individual) pairs to canonical participant records.
pub struct ParticipantResolver {
    participants: Arc<dyn ParticipantRepository>,
    roles: Arc<dyn ParticipantRoleRepository>,
    individuals: Arc<dyn IndividualContactRepository>,
    incidents: Arc<dyn IncidentRepository>,
    cases: Arc<dyn CaseRepository>,
    services: Arc<dyn OncallServiceRepository>,
    plugins: PluginRegistry,
}

impl ParticipantResolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        roles: Arc<dyn ParticipantRoleRepository>,
        individuals: Arc<dyn IndividualContactRepository>,
        incidents: Arc<dyn IncidentRepository>,
        cases: Arc<dyn CaseRepository>,
        services: Arc<dyn OncallServiceRepository>,
        plugins: PluginRegistry,
    ) -> Self {
        Self {
            participants,
            roles,
            individuals,
            incidents,
            cases,
            services,
            plugins,
        }
    }

    /// Return the single participant for the (subject, individual) pair,
    /// creating it on first reference.
    ///
    /// Miss path: loads the subject and individual, asks the project's
    /// contact plugin (if any) for `{location, team, department}`, and
    /// persists a new participant with the given roles and optional
    /// service. Without a plugin, location and department default to
    /// `"Unknown"` and team to the domain of the individual's email.
    ///
    /// Hit path: appends every requested role to the existing participant
    /// (no dedup; historical records are distinguished by renounce status),
    /// and binds the supplied service only if the participant has none
    /// yet; first association wins, later differing service ids are
    /// silently ignored.
    pub async fn get_or_create(
        &self,
        subject: SubjectRef,
        individual_id: Uuid,
        service_id: Option<Uuid>,
        participant_roles: Vec<ParticipantRoleCreate>,
    ) -> Result<Participant> {
        let start = Instant::now();

        let existing = self
            .participants
            .get_by_subject_and_individual(subject, individual_id)
            .await?;

        let participant = match existing {
            None => {
                match self
                    .create_participant(subject, individual_id, service_id, &participant_roles)
                    .await
                {
                    Ok(participant) => participant,
                    Err(e) if e.is_unique_violation() => {
                        // Lost the insert race; the winner's record is the
                        // canonical one.
                        debug!(
                            subsystem = "service",
                            component = "participant_resolver",
                            individual_id = %individual_id,
                            "Concurrent insert detected, retrying as lookup"
                        );
                        let participant = self
                            .participants
                            .get_by_subject_and_individual(subject, individual_id)
                            .await?
                            .ok_or_else(|| {
                                Error::Internal(
                                    "participant vanished after unique violation".to_string(),
                                )
                            })?;
                        self.enrich_existing(&participant, service_id, &participant_roles)
                            .await?
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(participant) => {
                self.enrich_existing(&participant, service_id, &participant_roles)
                    .await?
            }
        };

        info!(
            subsystem = "service",
            component = "participant_resolver",
            op = "get_or_create",
            participant_id = %participant.id,
            individual_id = %individual_id,
            role_count = participant_roles.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved participant"
        );
        Ok(participant)
    }

    /// Miss path: enrich from the contact plugin and persist.
    async fn create_participant(
        &self,
        subject: SubjectRef,
        individual_id: Uuid,
        service_id: Option<Uuid>,
        participant_roles: &[ParticipantRoleCreate],
    ) -> Result<Participant> {
        let project_id = self.subject_project(subject).await?;

        let individual = self
            .individuals
            .get(individual_id)
            .await?
            .ok_or(Error::IndividualNotFound(individual_id))?;

        let info = match self
            .plugins
            .get_active_instance(project_id, defaults::CONTACT_PLUGIN_TYPE)
        {
            Some(plugin) => plugin.get(&individual.email).await?,
            None => ContactInfo::default(),
        };

        let (team, department, location) = resolve_contact_fields(&info, &individual);

        // Only bind a service that actually exists.
        let service_id = match service_id {
            Some(id) => self.services.get(id).await?.map(|s| s.id),
            None => None,
        };

        self.participants
            .create(CreateParticipantRequest {
                subject,
                individual_contact_id: individual_id,
                service_id,
                team: Some(team),
                department: Some(department),
                location: Some(location),
                added_by_id: None,
                added_reason: None,
                roles: participant_roles.to_vec(),
            })
            .await
    }

    /// Hit path: append roles, bind service write-once.
    async fn enrich_existing(
        &self,
        participant: &Participant,
        service_id: Option<Uuid>,
        participant_roles: &[ParticipantRoleCreate],
    ) -> Result<Participant> {
        for role in participant_roles {
            self.roles.create(participant.id, role.clone()).await?;
        }

        if participant.service_id.is_none() {
            if let Some(service_id) = service_id {
                // Silently skipped when the id resolves to nothing, and a
                // no-op when another caller bound a service in between.
                if self.services.get(service_id).await?.is_some() {
                    self.participants
                        .associate_service_once(participant.id, service_id)
                        .await?;
                }
            }
        }

        self.participants
            .get(participant.id)
            .await?
            .ok_or(Error::ParticipantNotFound(participant.id))
    }

    /// Load the subject record and return its owning project.
    async fn subject_project(&self, subject: SubjectRef) -> Result<Uuid> {
        match subject.kind {
            SubjectKind::Incident => Ok(self
                .incidents
                .get(subject.id)
                .await?
                .ok_or(Error::IncidentNotFound(subject.id))?
                .project_id),
            SubjectKind::Case => Ok(self
                .cases
                .get(subject.id)
                .await?
                .ok_or(Error::CaseNotFound(subject.id))?
                .project_id),
        }
    }
}

/// Apply enrichment defaults: location and department fall back to
/// `"Unknown"`, team to the domain of the individual's email.
fn resolve_contact_fields(
    info: &ContactInfo,
    individual: &IndividualContact,
) -> (String, String, String) {
    let team = info.team.clone().unwrap_or_else(|| {
        individual
            .email
            .split('@')
            .nth(1)
            .unwrap_or(individual.email.as_str())
            .to_string()
    });
    let department = info
        .department
        .clone()
        .unwrap_or_else(|| defaults::UNKNOWN_DEPARTMENT.to_string());
    let location = info
        .location
        .clone()
        .unwrap_or_else(|| defaults::UNKNOWN_LOCATION.to_string());
    (team, department, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn individual(email: &str) -> IndividualContact {
        IndividualContact {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            email: email.to_string(),
            name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_contact_fields_default_to_email_domain_and_unknown() {
        let (team, department, location) =
            resolve_contact_fields(&ContactInfo::default(), &individual("a@example.com"));
        assert_eq!(team, "example.com");
        assert_eq!(department, "Unknown");
        assert_eq!(location, "Unknown");
    }

    #[test]
    fn test_contact_fields_prefer_plugin_values() {
        let info = ContactInfo {
            location: Some("Berlin".to_string()),
            team: Some("SRE".to_string()),
            department: Some("Engineering".to_string()),
        };
        let (team, department, location) =
            resolve_contact_fields(&info, &individual("a@example.com"));
        assert_eq!(team, "SRE");
        assert_eq!(department, "Engineering");
        assert_eq!(location, "Berlin");
    }

    #[test]
    fn test_contact_fields_partial_plugin_values() {
        let info = ContactInfo {
            location: Some("Berlin".to_string()),
            team: None,
            department: None,
        };
        let (team, department, location) =
            resolve_contact_fields(&info, &individual("b@corp.example"));
        assert_eq!(team, "corp.example");
        assert_eq!(department, "Unknown");
        assert_eq!(location, "Berlin");
    }

    #[test]
    fn test_contact_fields_email_without_domain() {
        let (team, _, _) = resolve_contact_fields(&ContactInfo::default(), &individual("nodomain"));
        assert_eq!(team, "nodomain");
    }
}
