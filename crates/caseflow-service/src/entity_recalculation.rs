//! Entity recalculation for signal instances.
//!
//! When an entity type is newly associated with a signal, the entities of
//! an existing instance are recomputed: project-wide (`scope = all`) types
//! plus the signal's associated types plus the new type are re-run over the
//! instance's raw payload, and the instance's entity set is replaced.
//!
//! The follow-up notification is fire-and-forget: a dispatch failure is
//! logged and never rolls back the recalculation already committed.

use std::sync::Arc;

use caseflow_core::{
    CaseRepository, EntityScope, EntityType, EntityTypeRepository, Error, NotificationDispatcher,
    Result, SignalInstance, SignalInstanceRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity_extraction::find_entities;

pub struct EntityRecalculator {
    entity_types: Arc<dyn EntityTypeRepository>,
    signal_instances: Arc<dyn SignalInstanceRepository>,
    cases: Arc<dyn CaseRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl EntityRecalculator {
    pub fn new(
        entity_types: Arc<dyn EntityTypeRepository>,
        signal_instances: Arc<dyn SignalInstanceRepository>,
        cases: Arc<dyn CaseRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            entity_types,
            signal_instances,
            cases,
            dispatcher,
        }
    }

    /// Recompute and replace the entity set of a signal instance after
    /// `entity_type` was associated with its signal. Returns the updated
    /// instance.
    pub async fn recalculate(
        &self,
        entity_type: &EntityType,
        signal_instance_id: Uuid,
    ) -> Result<SignalInstance> {
        let instance = self
            .signal_instances
            .get(signal_instance_id)
            .await?
            .ok_or(Error::SignalInstanceNotFound(signal_instance_id))?;

        let mut entity_types = self
            .entity_types
            .get_all(instance.project_id, Some(EntityScope::All))
            .await?;
        for associated in self.entity_types.get_for_signal(instance.signal_id).await? {
            if !entity_types.iter().any(|et| et.id == associated.id) {
                entity_types.push(associated);
            }
        }
        if !entity_types.iter().any(|et| et.id == entity_type.id) {
            entity_types.push(entity_type.clone());
        }

        let entities = find_entities(&instance.raw, &entity_types);
        self.signal_instances
            .replace_entities(instance.id, &entities)
            .await?;

        info!(
            subsystem = "service",
            component = "entity_recalculation",
            op = "recalculate",
            signal_instance_id = %instance.id,
            entity_type_id = %entity_type.id,
            entity_count = entities.len(),
            "Recalculated signal instance entities"
        );

        self.notify(entity_type, &instance).await;

        self.signal_instances
            .get(instance.id)
            .await?
            .ok_or(Error::SignalInstanceNotFound(instance.id))
    }

    /// Best-effort notification; failures are logged and swallowed.
    async fn notify(&self, entity_type: &EntityType, instance: &SignalInstance) {
        let Some(case_id) = instance.case_id else {
            return;
        };

        let case = match self.cases.get(case_id).await {
            Ok(Some(case)) => case,
            Ok(None) => return,
            Err(e) => {
                warn!(
                    subsystem = "service",
                    component = "entity_recalculation",
                    case_id = %case_id,
                    error = %e,
                    "Failed to load case for entity update notification"
                );
                return;
            }
        };

        if let Err(e) = self
            .dispatcher
            .send_entity_update_notification(entity_type, &case)
            .await
        {
            warn!(
                subsystem = "service",
                component = "entity_recalculation",
                case_id = %case.id,
                entity_type_id = %entity_type.id,
                error = %e,
                "Failed to send entity update notification"
            );
        }
    }
}

/// Dispatcher that only logs; the default when no messaging integration is
/// configured.
pub struct LogOnlyDispatcher;

#[async_trait::async_trait]
impl NotificationDispatcher for LogOnlyDispatcher {
    async fn send_entity_update_notification(
        &self,
        entity_type: &EntityType,
        case: &caseflow_core::Case,
    ) -> Result<()> {
        info!(
            subsystem = "service",
            component = "notifications",
            entity_type_id = %entity_type.id,
            case_id = %case.id,
            "Entity update notification (no dispatcher configured)"
        );
        Ok(())
    }
}
