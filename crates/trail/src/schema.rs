//! Stored audit value layouts and their decoding into entries.

use rmaudit_audit::{AuditValue, StoredAuditEntry};
use rmaudit_core::{PropertyMap, QName};

use crate::entry::RecordsManagementAuditEntry;
use crate::events::{LOGIN_FAILURE, LOGIN_SUCCESS};

/// Data paths, relative to an application root.
pub mod paths {
    pub const EVENT_NAME: &str = "/event/name/value";
    pub const PERSON_FULL_NAME: &str = "/event/person/fullName";
    pub const PERSON_ROLES: &str = "/event/person/roles";
    pub const NODE_NODEREF: &str = "/event/node/noderef";
    pub const NODE_NAME: &str = "/event/node/name";
    pub const NODE_TYPE: &str = "/event/node/type";
    pub const NODE_IDENTIFIER: &str = "/event/node/identifier";
    pub const NODE_NAME_PATH: &str = "/event/node/namePath";
    pub const NODE_CHANGES_BEFORE: &str = "/event/node/changes/before/value";
    pub const NODE_CHANGES_AFTER: &str = "/event/node/changes/after/value";
    pub const LOGIN_USER_NAME: &str = "/login/args/userName/value";
    pub const LOGIN_FULL_NAME: &str = "/login/no-error/fullName";
    pub const LOGIN_ERROR: &str = "/login/error/value";
}

/// The audit applications records-management data is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSchema {
    /// Current layout, rooted at `/RM`.
    Rm,
    /// Legacy DOD 5015 layout, rooted at `/DOD5015`.
    Dod5015,
}

/// A stored entry turned back into a records-management entry.
#[derive(Debug)]
pub enum DecodedEntry {
    /// A node event. `node_type` is the raw type name, still to be resolved
    /// to a display title.
    Event {
        entry: RecordsManagementAuditEntry,
        node_type: Option<QName>,
    },
    Login {
        success: bool,
        entry: RecordsManagementAuditEntry,
    },
}

impl DecodedEntry {
    pub fn entry(&self) -> &RecordsManagementAuditEntry {
        match self {
            Self::Event { entry, .. } | Self::Login { entry, .. } => entry,
        }
    }

    pub fn into_parts(self) -> (RecordsManagementAuditEntry, Option<QName>) {
        match self {
            Self::Event { entry, node_type } => (entry, node_type),
            Self::Login { entry, .. } => (entry, None),
        }
    }
}

impl AuditSchema {
    pub const ALL: [Self; 2] = [Self::Rm, Self::Dod5015];

    /// Audit application name.
    pub fn application(self) -> &'static str {
        match self {
            Self::Rm => "RM",
            Self::Dod5015 => "DOD5015",
        }
    }

    pub fn root(self) -> &'static str {
        match self {
            Self::Rm => "/RM",
            Self::Dod5015 => "/DOD5015",
        }
    }

    /// Full path of a data path under this schema's root.
    pub fn path(self, relative: &str) -> String {
        format!("{}{relative}", self.root())
    }

    /// Decode a stored entry, trying event layouts before login layouts.
    ///
    /// Returns `None` for values no schema recognises.
    pub fn decode_any(stored: &StoredAuditEntry) -> Option<DecodedEntry> {
        Self::ALL
            .iter()
            .find_map(|schema| schema.decode_event(stored))
            .or_else(|| {
                Self::ALL
                    .iter()
                    .find_map(|schema| schema.decode_login(stored))
            })
    }

    fn text(self, stored: &StoredAuditEntry, relative: &str) -> Option<String> {
        stored
            .values
            .get(&self.path(relative))
            .and_then(AuditValue::as_text)
            .map(str::to_owned)
    }

    fn properties(self, stored: &StoredAuditEntry, relative: &str) -> PropertyMap {
        stored
            .values
            .get(&self.path(relative))
            .and_then(AuditValue::as_properties)
            .cloned()
            .unwrap_or_default()
    }

    /// Decode a node event recorded under this schema.
    pub fn decode_event(self, stored: &StoredAuditEntry) -> Option<DecodedEntry> {
        let event = self.text(stored, paths::EVENT_NAME)?;
        let values = &stored.values;

        let mut entry = RecordsManagementAuditEntry::new(stored.time);
        entry.user_name.clone_from(&stored.user);
        entry.event = Some(event);
        entry.full_name = self.text(stored, paths::PERSON_FULL_NAME);
        entry.user_role = self.text(stored, paths::PERSON_ROLES);
        entry.node = values
            .get(&self.path(paths::NODE_NODEREF))
            .and_then(AuditValue::as_node_ref)
            .cloned();
        entry.node_name = self.text(stored, paths::NODE_NAME);
        entry.identifier = self.text(stored, paths::NODE_IDENTIFIER);
        entry.path = self.text(stored, paths::NODE_NAME_PATH);
        entry.set_properties(
            self.properties(stored, paths::NODE_CHANGES_BEFORE),
            self.properties(stored, paths::NODE_CHANGES_AFTER),
        );

        let node_type = values
            .get(&self.path(paths::NODE_TYPE))
            .and_then(AuditValue::as_qname)
            .cloned();
        Some(DecodedEntry::Event { entry, node_type })
    }

    /// Decode a login attempt recorded under this schema.
    pub fn decode_login(self, stored: &StoredAuditEntry) -> Option<DecodedEntry> {
        let user = self.text(stored, paths::LOGIN_USER_NAME)?;
        let success = !stored.values.contains_key(&self.path(paths::LOGIN_ERROR));

        let mut entry = RecordsManagementAuditEntry::new(stored.time);
        if success {
            entry.event = Some(LOGIN_SUCCESS.to_owned());
            entry.full_name = self.text(stored, paths::LOGIN_FULL_NAME);
        } else {
            entry.event = Some(LOGIN_FAILURE.to_owned());
            entry.full_name = Some(user.clone());
        }
        entry.user_name = Some(user);
        Some(DecodedEntry::Login { success, entry })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rmaudit_audit::AuditValues;
    use rmaudit_core::model::{PROP_NAME, TYPE_FOLDER};
    use rmaudit_core::{NodeRef, PropertyValue};

    use super::*;

    fn stored(application: &str, values: AuditValues) -> StoredAuditEntry {
        StoredAuditEntry {
            id: 1,
            application: application.to_owned(),
            user: Some("alice".to_owned()),
            time: Utc::now(),
            values,
        }
    }

    fn event_values(schema: AuditSchema) -> AuditValues {
        AuditValues::from([
            (schema.path(paths::EVENT_NAME), AuditValue::from("Update Metadata")),
            (
                schema.path(paths::NODE_NODEREF),
                AuditValue::from(NodeRef::in_spaces_store("n1")),
            ),
            (schema.path(paths::NODE_TYPE), AuditValue::from(TYPE_FOLDER)),
            (schema.path(paths::PERSON_FULL_NAME), AuditValue::from("Alice A")),
            (
                schema.path(paths::NODE_CHANGES_AFTER),
                AuditValue::from(PropertyMap::from([(PROP_NAME, PropertyValue::text("b"))])),
            ),
        ])
    }

    #[test]
    fn current_and_legacy_events_decode_alike() {
        for schema in AuditSchema::ALL {
            let decoded =
                AuditSchema::decode_any(&stored(schema.application(), event_values(schema)))
                    .unwrap();
            let (entry, node_type) = decoded.into_parts();
            assert_eq!(entry.event.as_deref(), Some("Update Metadata"));
            assert_eq!(entry.user_name.as_deref(), Some("alice"));
            assert_eq!(entry.full_name.as_deref(), Some("Alice A"));
            assert_eq!(entry.node, Some(NodeRef::in_spaces_store("n1")));
            assert_eq!(node_type, Some(TYPE_FOLDER));
            assert!(entry.before().is_empty());
            assert_eq!(entry.after().len(), 1);
        }
    }

    #[test]
    fn login_success_and_failure() {
        let schema = AuditSchema::Rm;
        let success = stored(
            "RM",
            AuditValues::from([
                (schema.path(paths::LOGIN_USER_NAME), AuditValue::from("bob")),
                (schema.path(paths::LOGIN_FULL_NAME), AuditValue::from("Bob B")),
            ]),
        );
        let decoded = AuditSchema::decode_any(&success).unwrap();
        assert!(matches!(decoded, DecodedEntry::Login { success: true, .. }));
        assert_eq!(decoded.entry().event.as_deref(), Some(LOGIN_SUCCESS));
        assert_eq!(decoded.entry().user_name.as_deref(), Some("bob"));
        assert_eq!(decoded.entry().full_name.as_deref(), Some("Bob B"));

        let schema = AuditSchema::Dod5015;
        let failure = stored(
            "DOD5015",
            AuditValues::from([
                (schema.path(paths::LOGIN_USER_NAME), AuditValue::from("mallory")),
                (schema.path(paths::LOGIN_ERROR), AuditValue::from("bad password")),
            ]),
        );
        let decoded = AuditSchema::decode_any(&failure).unwrap();
        assert!(matches!(decoded, DecodedEntry::Login { success: false, .. }));
        assert_eq!(decoded.entry().event.as_deref(), Some(LOGIN_FAILURE));
        assert_eq!(decoded.entry().full_name.as_deref(), Some("mallory"));
    }

    #[test]
    fn unrecognised_values_do_not_decode() {
        let odd = stored(
            "RM",
            AuditValues::from([("/RM/something/else".to_owned(), AuditValue::from("x"))]),
        );
        assert!(AuditSchema::decode_any(&odd).is_none());
    }
}
