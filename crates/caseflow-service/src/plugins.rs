//! Plugin registry for per-project capability lookup.
//!
//! Plugins are registered under a (project, capability type) key; flows
//! resolve the active instance at call time. An unregistered capability is
//! a valid, handled state, not an error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use caseflow_core::{defaults, ContactPlugin};
use tracing::debug;
use uuid::Uuid;

/// Registry of active plugin instances keyed by (project, capability type).
#[derive(Clone, Default)]
pub struct PluginRegistry {
    contact: Arc<RwLock<HashMap<(Uuid, String), Arc<dyn ContactPlugin>>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the active contact plugin instance for a project.
    ///
    /// Replaces any previously registered instance for the same key.
    pub fn register_contact(&self, project_id: Uuid, plugin: Arc<dyn ContactPlugin>) {
        let mut map = self.contact.write().expect("plugin registry lock poisoned");
        map.insert(
            (project_id, defaults::CONTACT_PLUGIN_TYPE.to_string()),
            plugin,
        );
    }

    /// Resolve the active plugin instance of the given capability type for
    /// a project. Returns `None` when no plugin is configured.
    pub fn get_active_instance(
        &self,
        project_id: Uuid,
        plugin_type: &str,
    ) -> Option<Arc<dyn ContactPlugin>> {
        let map = self.contact.read().expect("plugin registry lock poisoned");
        let instance = map.get(&(project_id, plugin_type.to_string())).cloned();

        debug!(
            subsystem = "plugins",
            component = "registry",
            project_id = %project_id,
            plugin_type = plugin_type,
            found = instance.is_some(),
            "Resolved plugin instance"
        );
        instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caseflow_core::{ContactInfo, Result};

    struct StaticContactPlugin;

    #[async_trait]
    impl ContactPlugin for StaticContactPlugin {
        async fn get(&self, _email: &str) -> Result<ContactInfo> {
            Ok(ContactInfo {
                location: Some("Berlin".to_string()),
                team: Some("SRE".to_string()),
                department: Some("Engineering".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_registry_resolves_registered_project_only() {
        let registry = PluginRegistry::new();
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();

        registry.register_contact(project_a, Arc::new(StaticContactPlugin));

        assert!(registry
            .get_active_instance(project_a, defaults::CONTACT_PLUGIN_TYPE)
            .is_some());
        assert!(registry
            .get_active_instance(project_b, defaults::CONTACT_PLUGIN_TYPE)
            .is_none());
    }

    #[tokio::test]
    async fn test_registry_is_keyed_by_capability_type() {
        let registry = PluginRegistry::new();
        let project = Uuid::new_v4();
        registry.register_contact(project, Arc::new(StaticContactPlugin));

        assert!(registry.get_active_instance(project, "ticketing").is_none());
    }
}
