//! Entity type and signal instance repository integration tests.
//!
//! These tests require a running PostgreSQL instance and are ignored by
//! default. Run with: cargo test -- --ignored

use caseflow_core::{
    CreateEntityTypeRequest, EntityCreate, EntityScope, EntityTypeRepository,
    SignalInstanceRepository,
};
use caseflow_db::test_fixtures::{
    cleanup_project, connect_test_db, create_project, create_signal,
};
use serde_json::json;
use uuid::Uuid;

fn entity_type_req(project_id: Uuid, name: &str, scope: EntityScope) -> CreateEntityTypeRequest {
    CreateEntityTypeRequest {
        project_id,
        name: name.to_string(),
        description: None,
        scope,
        regular_expression: None,
        jpath: Some("source.ip".to_string()),
        enabled: true,
    }
}

#[tokio::test]
#[ignore] // Requires database
async fn test_entity_type_scope_roundtrip_and_filter() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "entity-type-scope").await.unwrap();

    let global = db
        .entity_types
        .create(entity_type_req(project_id, "source-ip", EntityScope::All))
        .await
        .unwrap();
    assert_eq!(global.scope, EntityScope::All);

    db.entity_types
        .create(entity_type_req(project_id, "hostname", EntityScope::Single))
        .await
        .unwrap();

    let all_scoped = db
        .entity_types
        .get_all(project_id, Some(EntityScope::All))
        .await
        .unwrap();
    assert_eq!(all_scoped.len(), 1);
    assert_eq!(all_scoped[0].id, global.id);

    let unfiltered = db.entity_types.get_all(project_id, None).await.unwrap();
    assert_eq!(unfiltered.len(), 2);

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_signal_association_is_idempotent() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "entity-type-signal").await.unwrap();
    let signal_id = create_signal(&db.pool, project_id, "guardduty").await.unwrap();

    let entity_type = db
        .entity_types
        .create(entity_type_req(project_id, "source-ip", EntityScope::Single))
        .await
        .unwrap();

    db.entity_types
        .associate_with_signal(entity_type.id, signal_id)
        .await
        .unwrap();
    db.entity_types
        .associate_with_signal(entity_type.id, signal_id)
        .await
        .unwrap();

    let associated = db.entity_types.get_for_signal(signal_id).await.unwrap();
    assert_eq!(associated.len(), 1);
    assert_eq!(associated[0].id, entity_type.id);

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_replace_entities_upserts_by_value() {
    let db = connect_test_db().await;
    let project_id = create_project(&db.pool, "signal-entities").await.unwrap();
    let signal_id = create_signal(&db.pool, project_id, "guardduty").await.unwrap();

    let entity_type = db
        .entity_types
        .create(entity_type_req(project_id, "source-ip", EntityScope::Single))
        .await
        .unwrap();

    let instance = db
        .signal_instances
        .create(
            signal_id,
            project_id,
            None,
            json!({"source": {"ip": "10.0.0.7"}}),
        )
        .await
        .unwrap();

    let entity = EntityCreate {
        entity_type_id: entity_type.id,
        value: "10.0.0.7".to_string(),
    };
    db.signal_instances
        .replace_entities(instance.id, std::slice::from_ref(&entity))
        .await
        .unwrap();
    let first = db.signal_instances.get_entities(instance.id).await.unwrap();
    assert_eq!(first.len(), 1);

    // Replacing with the same value reuses the entity row.
    db.signal_instances
        .replace_entities(instance.id, std::slice::from_ref(&entity))
        .await
        .unwrap();
    let second = db.signal_instances.get_entities(instance.id).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id);

    // Replacing with a different set drops the old association.
    db.signal_instances
        .replace_entities(
            instance.id,
            &[EntityCreate {
                entity_type_id: entity_type.id,
                value: "10.0.0.8".to_string(),
            }],
        )
        .await
        .unwrap();
    let third = db.signal_instances.get_entities(instance.id).await.unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].value, "10.0.0.8");

    cleanup_project(&db.pool, project_id).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_replace_entities_for_missing_instance_is_typed_error() {
    let db = connect_test_db().await;
    let missing = Uuid::new_v4();

    let err = db
        .signal_instances
        .replace_entities(missing, &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        caseflow_core::Error::SignalInstanceNotFound(id) if id == missing
    ));
}
