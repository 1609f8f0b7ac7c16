use dashmap::DashMap;
use serde::Serialize;

use crate::messages::{
    MSG_AUDIT_CLEAR, MSG_AUDIT_START, MSG_AUDIT_STOP, MSG_AUDIT_VIEW, Messages,
};

pub const AUDIT_EVENT_START: &str = "audit.start";
pub const AUDIT_EVENT_STOP: &str = "audit.stop";
pub const AUDIT_EVENT_CLEAR: &str = "audit.clear";
pub const AUDIT_EVENT_VIEW: &str = "audit.view";

/// Synthetic event names given to decoded login entries.
pub const LOGIN_SUCCESS: &str = "Login.Success";
pub const LOGIN_FAILURE: &str = "Login.Failure";

/// Events whose node is a person or group rather than a navigable node.
pub const EVENT_CREATE_PERSON: &str = "Create Person";
pub const EVENT_DELETE_PERSON: &str = "Delete Person";
pub const EVENT_CREATE_USER_GROUP: &str = "Create User Group";
pub const EVENT_DELETE_USER_GROUP: &str = "Delete User Group";
pub const EVENT_ADD_TO_USER_GROUP: &str = "Add To User Group";
pub const EVENT_REMOVE_FROM_USER_GROUP: &str = "Remove From User Group";
pub const EVENT_DELETE_RM_OBJECT: &str = "Delete RM Object";
pub const EVENT_DELETE_HOLD: &str = "Delete Hold";

/// A named, displayable audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub name: String,
    pub label: String,
}

/// Registry of known audit events, keyed by name.
#[derive(Debug, Default)]
pub struct AuditEventRegistry {
    events: DashMap<String, AuditEvent>,
}

impl AuditEventRegistry {
    /// A registry holding the audit-log lifecycle events.
    pub fn with_builtins(messages: &Messages) -> Self {
        let registry = Self::default();
        for (name, key) in [
            (AUDIT_EVENT_CLEAR, MSG_AUDIT_CLEAR),
            (AUDIT_EVENT_START, MSG_AUDIT_START),
            (AUDIT_EVENT_STOP, MSG_AUDIT_STOP),
            (AUDIT_EVENT_VIEW, MSG_AUDIT_VIEW),
        ] {
            registry.register(name, &messages.get(key));
        }
        registry
    }

    /// Register (or relabel) an event.
    pub fn register(&self, name: &str, label: &str) {
        self.events.insert(
            name.to_owned(),
            AuditEvent {
                name: name.to_owned(),
                label: label.to_owned(),
            },
        );
    }

    /// Display label for `name`, falling back to the name itself.
    pub fn label(&self, name: &str) -> String {
        self.events
            .get(name)
            .map_or_else(|| name.to_owned(), |e| e.label.clone())
    }

    /// All events, sorted by label.
    pub fn events(&self) -> Vec<AuditEvent> {
        let mut events: Vec<AuditEvent> = self.events.iter().map(|e| e.value().clone()).collect();
        events.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.name.cmp(&b.name)));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_sorted_by_label() {
        let registry = AuditEventRegistry::with_builtins(&Messages::default());
        registry.register("file", "File Record");
        let labels: Vec<String> = registry.events().into_iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec![
                "Audit Clear",
                "Audit Start",
                "Audit Stop",
                "Audit View",
                "File Record"
            ]
        );
    }

    #[test]
    fn unknown_events_label_as_their_name() {
        let registry = AuditEventRegistry::default();
        assert_eq!(registry.label("Update Metadata"), "Update Metadata");
        registry.register("Update Metadata", "Metadata Updated");
        assert_eq!(registry.label("Update Metadata"), "Metadata Updated");
    }
}
