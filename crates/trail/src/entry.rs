use std::sync::OnceLock;

use chrono::{DateTime, Utc};

use rmaudit_core::{NodeRef, PropertyMap, QName};

use crate::diff::{PropertyChange, changed_properties};

/// One reconstructed records-management audit entry.
#[derive(Debug, Clone, Default)]
pub struct RecordsManagementAuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    /// Concatenated role names of the acting user.
    pub user_role: Option<String>,
    pub event: Option<String>,
    pub node: Option<NodeRef>,
    pub node_name: Option<String>,
    /// Display title of the node type.
    pub node_type: Option<String>,
    pub identifier: Option<String>,
    /// Display path of the node when the event was recorded.
    pub path: Option<String>,
    before: PropertyMap,
    after: PropertyMap,
    changes: OnceLock<Vec<PropertyChange>>,
}

impl RecordsManagementAuditEntry {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Properties recorded before the event.
    pub fn before(&self) -> &PropertyMap {
        &self.before
    }

    /// Properties recorded after the event.
    pub fn after(&self) -> &PropertyMap {
        &self.after
    }

    /// Before/after pairs for every property in either map, computed on
    /// first use.
    pub fn changed_properties(&self) -> &[PropertyChange] {
        self.changes
            .get_or_init(|| changed_properties(&self.before, &self.after))
    }

    pub fn changed_property(&self, name: &QName) -> Option<&PropertyChange> {
        self.changed_properties().iter().find(|c| &c.name == name)
    }

    /// Replace the property maps, discarding any cached diff.
    pub(crate) fn set_properties(&mut self, before: PropertyMap, after: PropertyMap) {
        self.before = before;
        self.after = after;
        self.changes = OnceLock::new();
    }

    /// Mutable access to both maps, discarding any cached diff.
    pub(crate) fn properties_mut(&mut self) -> (&mut PropertyMap, &mut PropertyMap) {
        self.changes = OnceLock::new();
        (&mut self.before, &mut self.after)
    }
}
