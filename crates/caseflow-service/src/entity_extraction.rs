//! Entity extraction from signal instance payloads.
//!
//! Pure functions: given a raw JSON payload and a set of entity types,
//! produce the values each type extracts. A type selects its input text via
//! an optional dot-separated field path (`jpath`), then applies its
//! optional regex; the first capture group (or the whole match) becomes the
//! entity value.

use std::collections::HashSet;

use caseflow_core::{EntityCreate, EntityType};
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::warn;

/// Extract entities for all given types from a raw payload.
///
/// Disabled types are skipped. An invalid regex skips its type with a
/// warning instead of failing the whole extraction. Values are
/// deduplicated per type; order follows the input type order.
pub fn find_entities(raw: &JsonValue, entity_types: &[EntityType]) -> Vec<EntityCreate> {
    let mut results = Vec::new();
    let mut seen: HashSet<(uuid::Uuid, String)> = HashSet::new();

    for entity_type in entity_types {
        if !entity_type.enabled {
            continue;
        }

        for value in extract_for_type(raw, entity_type) {
            if seen.insert((entity_type.id, value.clone())) {
                results.push(EntityCreate {
                    entity_type_id: entity_type.id,
                    value,
                });
            }
        }
    }

    results
}

fn extract_for_type(raw: &JsonValue, entity_type: &EntityType) -> Vec<String> {
    let haystack = match &entity_type.jpath {
        Some(path) => match select_field(raw, path) {
            Some(text) => text,
            None => return Vec::new(),
        },
        None => raw.to_string(),
    };

    match &entity_type.regular_expression {
        Some(pattern) => {
            let regex = match Regex::new(pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    warn!(
                        subsystem = "service",
                        component = "entity_extraction",
                        entity_type_id = %entity_type.id,
                        error = %e,
                        "Skipping entity type with invalid regular expression"
                    );
                    return Vec::new();
                }
            };

            regex
                .captures_iter(&haystack)
                .filter_map(|caps| {
                    caps.get(1)
                        .or_else(|| caps.get(0))
                        .map(|m| m.as_str().to_string())
                })
                .collect()
        }
        // No regex: the selected field's value is the entity, but only
        // when a field was actually selected.
        None => match &entity_type.jpath {
            Some(_) => vec![haystack],
            None => Vec::new(),
        },
    }
}

/// Navigate a dot-separated path into the payload, rendering the selected
/// value as text. Scalars render verbatim, containers as JSON.
fn select_field(raw: &JsonValue, path: &str) -> Option<String> {
    let mut current = raw;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }

    match current {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::EntityScope;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn entity_type(
        regular_expression: Option<&str>,
        jpath: Option<&str>,
        enabled: bool,
    ) -> EntityType {
        EntityType {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "test-type".to_string(),
            description: None,
            scope: EntityScope::All,
            regular_expression: regular_expression.map(String::from),
            jpath: jpath.map(String::from),
            enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_regex_over_whole_payload() {
        let raw = json!({"message": "login from 10.0.0.1 and 10.0.0.2"});
        let ip_type = entity_type(Some(r"\b(?:\d{1,3}\.){3}\d{1,3}\b"), None, true);

        let entities = find_entities(&raw, &[ip_type.clone()]);
        let values: Vec<&str> = entities.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(entities.iter().all(|e| e.entity_type_id == ip_type.id));
    }

    #[test]
    fn test_regex_first_capture_group_wins() {
        let raw = json!({"message": "user=alice user=bob"});
        let user_type = entity_type(Some(r"user=(\w+)"), None, true);

        let entities = find_entities(&raw, &[user_type]);
        let values: Vec<&str> = entities.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["alice", "bob"]);
    }

    #[test]
    fn test_jpath_selects_field_without_regex() {
        let raw = json!({"actor": {"email": "a@example.com"}});
        let email_type = entity_type(None, Some("actor.email"), true);

        let entities = find_entities(&raw, &[email_type]);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].value, "a@example.com");
    }

    #[test]
    fn test_jpath_with_regex_scopes_the_search() {
        let raw = json!({
            "source": "ignore 10.1.1.1",
            "target": "match 10.2.2.2"
        });
        let scoped = entity_type(Some(r"(?:\d{1,3}\.){3}\d{1,3}"), Some("target"), true);

        let entities = find_entities(&raw, &[scoped]);
        let values: Vec<&str> = entities.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["10.2.2.2"]);
    }

    #[test]
    fn test_missing_jpath_field_yields_nothing() {
        let raw = json!({"actor": {}});
        let email_type = entity_type(None, Some("actor.email"), true);
        assert!(find_entities(&raw, &[email_type]).is_empty());
    }

    #[test]
    fn test_values_deduplicated_per_type() {
        let raw = json!({"message": "10.0.0.1 seen again at 10.0.0.1"});
        let ip_type = entity_type(Some(r"(?:\d{1,3}\.){3}\d{1,3}"), None, true);

        let entities = find_entities(&raw, &[ip_type]);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_disabled_type_is_skipped() {
        let raw = json!({"message": "10.0.0.1"});
        let disabled = entity_type(Some(r"(?:\d{1,3}\.){3}\d{1,3}"), None, false);
        assert!(find_entities(&raw, &[disabled]).is_empty());
    }

    #[test]
    fn test_invalid_regex_is_skipped_not_fatal() {
        let raw = json!({"message": "10.0.0.1"});
        let broken = entity_type(Some(r"(unclosed"), None, true);
        let valid = entity_type(Some(r"(?:\d{1,3}\.){3}\d{1,3}"), None, true);

        let entities = find_entities(&raw, &[broken, valid]);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].value, "10.0.0.1");
    }

    #[test]
    fn test_type_with_neither_regex_nor_jpath_extracts_nothing() {
        let raw = json!({"message": "anything"});
        let bare = entity_type(None, None, true);
        assert!(find_entities(&raw, &[bare]).is_empty());
    }
}
