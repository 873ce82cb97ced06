//! Entity recalculation flow tests against the in-memory mocks.

use std::sync::Arc;

use caseflow_core::{
    CreateEntityTypeRequest, EntityScope, EntityType, EntityTypeRepository, Error,
    SignalInstanceRepository,
};
use caseflow_service::mock::{MockDirectory, MockSignalStore, RecordingDispatcher};
use caseflow_service::EntityRecalculator;
use serde_json::json;
use uuid::Uuid;

fn entity_type_req(project_id: Uuid, name: &str, scope: EntityScope) -> CreateEntityTypeRequest {
    CreateEntityTypeRequest {
        project_id,
        name: name.to_string(),
        description: None,
        scope,
        regular_expression: None,
        jpath: None,
        enabled: true,
    }
}

async fn ip_type(store: &Arc<MockSignalStore>, project_id: Uuid, scope: EntityScope) -> EntityType {
    let mut req = entity_type_req(project_id, "source-ip", scope);
    req.jpath = Some("source.ip".to_string());
    EntityTypeRepository::create(store.as_ref(), req)
        .await
        .unwrap()
}

fn recalculator(
    store: &Arc<MockSignalStore>,
    directory: &Arc<MockDirectory>,
    dispatcher: Arc<RecordingDispatcher>,
) -> EntityRecalculator {
    EntityRecalculator::new(
        store.clone(),
        store.clone(),
        directory.clone(),
        dispatcher,
    )
}

#[tokio::test]
async fn test_recalculate_replaces_entity_set() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let project_id = Uuid::new_v4();
    let signal_id = Uuid::new_v4();

    let stale_type = ip_type(&store, project_id, EntityScope::Single).await;
    let instance = store.add_instance(
        signal_id,
        project_id,
        None,
        json!({"source": {"ip": "10.0.0.7"}, "user": "mallory"}),
    );
    store
        .replace_entities(
            instance.id,
            &[caseflow_core::EntityCreate {
                entity_type_id: stale_type.id,
                value: "stale-value".to_string(),
            }],
        )
        .await
        .unwrap();

    let mut req = entity_type_req(project_id, "actor", EntityScope::Single);
    req.jpath = Some("user".to_string());
    let new_type = EntityTypeRepository::create(store.as_ref(), req)
        .await
        .unwrap();

    let recalc = recalculator(&store, &directory, Arc::new(RecordingDispatcher::new()));
    recalc.recalculate(&new_type, instance.id).await.unwrap();

    let entities = store.get_entities(instance.id).await.unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].entity_type_id, new_type.id);
    assert_eq!(entities[0].value, "mallory");
}

#[tokio::test]
async fn test_recalculate_combines_scope_all_signal_and_new_types() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let project_id = Uuid::new_v4();
    let signal_id = Uuid::new_v4();

    let global_type = ip_type(&store, project_id, EntityScope::All).await;

    let mut req = entity_type_req(project_id, "hostname", EntityScope::Single);
    req.jpath = Some("host".to_string());
    let signal_type = EntityTypeRepository::create(store.as_ref(), req)
        .await
        .unwrap();
    store
        .associate_with_signal(signal_type.id, signal_id)
        .await
        .unwrap();

    let mut req = entity_type_req(project_id, "actor", EntityScope::Single);
    req.jpath = Some("user".to_string());
    let new_type = EntityTypeRepository::create(store.as_ref(), req)
        .await
        .unwrap();

    let instance = store.add_instance(
        signal_id,
        project_id,
        None,
        json!({"source": {"ip": "10.0.0.7"}, "host": "db-3", "user": "mallory"}),
    );

    let recalc = recalculator(&store, &directory, Arc::new(RecordingDispatcher::new()));
    recalc.recalculate(&new_type, instance.id).await.unwrap();

    let entities = store.get_entities(instance.id).await.unwrap();
    let mut values: Vec<_> = entities.iter().map(|e| e.value.as_str()).collect();
    values.sort_unstable();
    assert_eq!(values, vec!["10.0.0.7", "db-3", "mallory"]);
}

#[tokio::test]
async fn test_recalculate_does_not_double_apply_associated_new_type() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let project_id = Uuid::new_v4();
    let signal_id = Uuid::new_v4();

    let entity_type = ip_type(&store, project_id, EntityScope::Single).await;
    store
        .associate_with_signal(entity_type.id, signal_id)
        .await
        .unwrap();
    let instance = store.add_instance(
        signal_id,
        project_id,
        None,
        json!({"source": {"ip": "10.0.0.7"}}),
    );

    let recalc = recalculator(&store, &directory, Arc::new(RecordingDispatcher::new()));
    recalc.recalculate(&entity_type, instance.id).await.unwrap();

    assert_eq!(store.get_entities(instance.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_notification_sent_for_case_bound_instance() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let project_id = Uuid::new_v4();
    let case = directory.add_case(project_id, "fraud-1");

    let entity_type = ip_type(&store, project_id, EntityScope::Single).await;
    let instance = store.add_instance(
        Uuid::new_v4(),
        project_id,
        Some(case.id),
        json!({"source": {"ip": "10.0.0.7"}}),
    );

    let dispatcher = Arc::new(RecordingDispatcher::new());
    let recalc = recalculator(&store, &directory, dispatcher.clone());
    recalc.recalculate(&entity_type, instance.id).await.unwrap();

    assert_eq!(
        dispatcher.sent.lock().unwrap().as_slice(),
        &[(entity_type.id, case.id)]
    );
}

#[tokio::test]
async fn test_notification_failure_does_not_roll_back_recalculation() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let project_id = Uuid::new_v4();
    let case = directory.add_case(project_id, "fraud-2");

    let entity_type = ip_type(&store, project_id, EntityScope::Single).await;
    let instance = store.add_instance(
        Uuid::new_v4(),
        project_id,
        Some(case.id),
        json!({"source": {"ip": "10.0.0.7"}}),
    );

    let dispatcher = Arc::new(RecordingDispatcher::failing());
    let recalc = recalculator(&store, &directory, dispatcher.clone());
    let updated = recalc.recalculate(&entity_type, instance.id).await.unwrap();

    assert_eq!(updated.id, instance.id);
    assert_eq!(store.get_entities(instance.id).await.unwrap().len(), 1);
    assert_eq!(dispatcher.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_no_notification_without_case() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let project_id = Uuid::new_v4();

    let entity_type = ip_type(&store, project_id, EntityScope::Single).await;
    let instance = store.add_instance(
        Uuid::new_v4(),
        project_id,
        None,
        json!({"source": {"ip": "10.0.0.7"}}),
    );

    let dispatcher = Arc::new(RecordingDispatcher::new());
    let recalc = recalculator(&store, &directory, dispatcher.clone());
    recalc.recalculate(&entity_type, instance.id).await.unwrap();

    assert!(dispatcher.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_instance_is_typed_error() {
    let store = MockSignalStore::new();
    let directory = MockDirectory::new();
    let entity_type = ip_type(&store, Uuid::new_v4(), EntityScope::Single).await;
    let missing = Uuid::new_v4();

    let recalc = recalculator(&store, &directory, Arc::new(RecordingDispatcher::new()));
    let err = recalc.recalculate(&entity_type, missing).await.unwrap_err();
    assert!(matches!(err, Error::SignalInstanceNotFound(id) if id == missing));
}
