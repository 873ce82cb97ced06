//! Participant repository integration tests.
//!
//! These tests require a running PostgreSQL instance and are ignored by
//! default. Run with: cargo test -- --ignored

use caseflow_core::{
    CreateParticipantRequest, IncidentRepository, IndividualContactRepository,
    OncallServiceRepository, ParticipantRepository, ParticipantRoleCreate,
    ParticipantRoleRepository, SubjectRef, UpdateParticipantRequest,
};
use caseflow_db::test_fixtures::{cleanup_project, connect_test_db, create_project};

fn request(
    subject: SubjectRef,
    individual_contact_id: uuid::Uuid,
    roles: Vec<ParticipantRoleCreate>,
) -> CreateParticipantRequest {
    CreateParticipantRequest {
        subject,
        individual_contact_id,
        service_id: None,
        team: Some("SRE".to_string()),
        department: Some("Engineering".to_string()),
        location: Some("Berlin".to_string()),
        added_by_id: None,
        added_reason: None,
        roles,
    }
}

#[tokio::test]
#[ignore] // Requires database
async fn test_participant_lifecycle() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "participant-lifecycle")
        .await
        .unwrap();

    let incident = db
        .incidents
        .create(project_id, "outage-1", Some("API outage"))
        .await
        .unwrap();
    let individual = db
        .individuals
        .create(project_id, "a@example.com", Some("Ada"))
        .await
        .unwrap();
    let subject = SubjectRef::incident(incident.id);

    let created = db
        .participants
        .create(request(
            subject,
            individual.id,
            vec![ParticipantRoleCreate::new("Observer")],
        ))
        .await
        .unwrap();
    assert_eq!(created.incident_id, Some(incident.id));
    assert_eq!(created.case_id, None);

    let found = db
        .participants
        .get_by_subject_and_individual(subject, individual.id)
        .await
        .unwrap()
        .expect("pair lookup should hit");
    assert_eq!(found.id, created.id);

    let read = db
        .participants
        .fetch_read(created.id)
        .await
        .unwrap()
        .expect("read should hit");
    assert_eq!(read.individual.email, "a@example.com");
    assert_eq!(read.roles.len(), 1);
    assert_eq!(read.roles[0].role, "Observer");

    db.participants.delete(created.id).await.unwrap();
    assert!(db.participants.get(created.id).await.unwrap().is_none());
    // Roles cascade with the participant.
    assert!(db
        .participant_roles
        .get_all_by_participant(created.id)
        .await
        .unwrap()
        .is_empty());

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_duplicate_pair_insert_is_unique_violation() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "participant-unique-pair")
        .await
        .unwrap();

    let incident = db
        .incidents
        .create(project_id, "outage-1", None)
        .await
        .unwrap();
    let individual = db
        .individuals
        .create(project_id, "a@example.com", None)
        .await
        .unwrap();
    let subject = SubjectRef::incident(incident.id);

    db.participants
        .create(request(subject, individual.id, vec![]))
        .await
        .unwrap();
    let err = db
        .participants
        .create(request(subject, individual.id, vec![]))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_role_lookup_skips_renounced_roles() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "participant-role-filter")
        .await
        .unwrap();

    let incident = db
        .incidents
        .create(project_id, "outage-1", None)
        .await
        .unwrap();
    let individual = db
        .individuals
        .create(project_id, "ic@example.com", None)
        .await
        .unwrap();

    let participant = db
        .participants
        .create(request(
            SubjectRef::incident(incident.id),
            individual.id,
            vec![ParticipantRoleCreate::new("Incident Commander")],
        ))
        .await
        .unwrap();

    let holder = db
        .participants
        .get_by_incident_id_and_role(incident.id, "Incident Commander")
        .await
        .unwrap()
        .expect("active role should match");
    assert_eq!(holder.id, participant.id);

    let role = db
        .participant_roles
        .get_active_roles(participant.id)
        .await
        .unwrap()
        .remove(0);
    db.participant_roles.renounce(role.id).await.unwrap();

    assert!(db
        .participants
        .get_by_incident_id_and_role(incident.id, "Incident Commander")
        .await
        .unwrap()
        .is_none());

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_email_and_service_and_conversation_lookups() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "participant-lookups")
        .await
        .unwrap();

    let incident = db
        .incidents
        .create(project_id, "outage-1", None)
        .await
        .unwrap();
    let individual = db
        .individuals
        .create(project_id, "oncall@example.com", None)
        .await
        .unwrap();
    let service = db
        .oncall_services
        .create(project_id, "pager-primary", Some("PX1"))
        .await
        .unwrap();

    let mut req = request(SubjectRef::incident(incident.id), individual.id, vec![]);
    req.service_id = Some(service.id);
    let participant = db.participants.create(req).await.unwrap();

    let by_email = db
        .participants
        .get_by_incident_id_and_email(incident.id, "oncall@example.com")
        .await
        .unwrap()
        .expect("email lookup should hit");
    assert_eq!(by_email.id, participant.id);

    let by_service = db
        .participants
        .get_by_incident_id_and_service_id(incident.id, service.id)
        .await
        .unwrap()
        .expect("service lookup should hit");
    assert_eq!(by_service.id, participant.id);

    db.participants
        .update(
            participant.id,
            UpdateParticipantRequest {
                user_conversation_id: Some("U123".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let by_conversation = db
        .participants
        .get_by_incident_id_and_conversation_id(incident.id, "U123")
        .await
        .unwrap()
        .expect("conversation lookup should hit");
    assert_eq!(by_conversation.id, participant.id);

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_associate_service_once_keeps_first_binding() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "participant-service-once")
        .await
        .unwrap();

    let incident = db
        .incidents
        .create(project_id, "outage-1", None)
        .await
        .unwrap();
    let individual = db
        .individuals
        .create(project_id, "a@example.com", None)
        .await
        .unwrap();
    let first = db
        .oncall_services
        .create(project_id, "pager-primary", None)
        .await
        .unwrap();
    let second = db
        .oncall_services
        .create(project_id, "pager-secondary", None)
        .await
        .unwrap();

    let participant = db
        .participants
        .create(request(SubjectRef::incident(incident.id), individual.id, vec![]))
        .await
        .unwrap();

    assert!(db
        .participants
        .associate_service_once(participant.id, first.id)
        .await
        .unwrap());
    assert!(!db
        .participants
        .associate_service_once(participant.id, second.id)
        .await
        .unwrap());

    let reloaded = db.participants.get(participant.id).await.unwrap().unwrap();
    assert_eq!(reloaded.service_id, Some(first.id));

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_list_returns_minimal_reads_with_active_roles() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "participant-list")
        .await
        .unwrap();

    let incident = db
        .incidents
        .create(project_id, "outage-1", None)
        .await
        .unwrap();
    let commander = db
        .individuals
        .create(project_id, "ic@example.com", Some("Ada"))
        .await
        .unwrap();
    let observer = db
        .individuals
        .create(project_id, "obs@example.com", None)
        .await
        .unwrap();
    let subject = SubjectRef::incident(incident.id);

    let first = db
        .participants
        .create(request(
            subject,
            commander.id,
            vec![
                ParticipantRoleCreate::new("Incident Commander"),
                ParticipantRoleCreate::new("Scribe"),
            ],
        ))
        .await
        .unwrap();
    db.participants
        .create(request(
            subject,
            observer.id,
            vec![ParticipantRoleCreate::new("Observer")],
        ))
        .await
        .unwrap();

    // Renounced roles drop out of the active set.
    let scribe = db
        .participant_roles
        .get_all_by_participant(first.id)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.role == "Scribe")
        .unwrap();
    db.participant_roles.renounce(scribe.id).await.unwrap();

    let reads = db.participants.list(subject).await.unwrap();
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0].id, first.id);
    assert_eq!(reads[0].individual.email, "ic@example.com");
    assert_eq!(reads[0].individual.name.as_deref(), Some("Ada"));
    assert_eq!(reads[0].active_roles, vec!["Incident Commander"]);
    assert_eq!(reads[1].individual.email, "obs@example.com");
    assert_eq!(reads[1].active_roles, vec!["Observer"]);

    cleanup_project(&db.pool, project_id).await;
}
