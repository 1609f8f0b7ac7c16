use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rmaudit_core::{NodeRef, PropertyMap, PropertyValue, QName};

/// A value stored against one audit path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditValue {
    /// A scalar property value (event name, node reference, type, ...).
    Property(PropertyValue),
    /// A property snapshot, as used for before/after change sets.
    Properties(PropertyMap),
}

impl AuditValue {
    /// Borrow the text of a scalar text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Property(value) => value.as_text(),
            Self::Properties(_) => None,
        }
    }

    #[must_use]
    pub fn as_node_ref(&self) -> Option<&NodeRef> {
        match self {
            Self::Property(value) => value.as_node_ref(),
            Self::Properties(_) => None,
        }
    }

    #[must_use]
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            Self::Property(value) => value.as_qname(),
            Self::Properties(_) => None,
        }
    }

    #[must_use]
    pub fn as_properties(&self) -> Option<&PropertyMap> {
        match self {
            Self::Properties(map) => Some(map),
            Self::Property(_) => None,
        }
    }
}

impl From<PropertyValue> for AuditValue {
    fn from(value: PropertyValue) -> Self {
        Self::Property(value)
    }
}

impl From<PropertyMap> for AuditValue {
    fn from(map: PropertyMap) -> Self {
        Self::Properties(map)
    }
}

impl From<&str> for AuditValue {
    fn from(value: &str) -> Self {
        Self::Property(PropertyValue::text(value))
    }
}

impl From<String> for AuditValue {
    fn from(value: String) -> Self {
        Self::Property(PropertyValue::Text(value))
    }
}

impl From<NodeRef> for AuditValue {
    fn from(node: NodeRef) -> Self {
        Self::Property(PropertyValue::NodeRef(node))
    }
}

impl From<QName> for AuditValue {
    fn from(qname: QName) -> Self {
        Self::Property(PropertyValue::QName(qname))
    }
}

/// Audit values keyed by hierarchical path (`/event/name/value`, ...).
pub type AuditValues = BTreeMap<String, AuditValue>;

/// Join path snippets such as `/event` and `/name` into `/event/name`.
///
/// Snippets may be given with or without a leading slash; empty snippets are
/// skipped.
#[must_use]
pub fn build_path(snippets: &[&str]) -> String {
    let mut path = String::new();
    for snippet in snippets {
        let trimmed = snippet.trim_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        path.push('/');
        path.push_str(trimmed);
    }
    path
}

/// One persisted audit entry as returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAuditEntry {
    /// Monotonic identifier assigned by the component.
    pub id: u64,
    /// Audit application the entry belongs to (e.g. `RM`).
    pub application: String,
    /// User that was active when the values were recorded.
    pub user: Option<String>,
    /// When the values were recorded.
    pub time: DateTime<Utc>,
    /// Full-path keyed values (`/RM/event/name/value`, ...).
    pub values: AuditValues,
}

/// Query parameters for searching stored audit entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQueryParameters {
    /// Restrict to one application.
    pub application: Option<String>,
    /// Restrict to one user.
    pub user: Option<String>,
    /// Entries recorded at or after this time.
    pub from_time: Option<DateTime<Utc>>,
    /// Entries recorded strictly before this time.
    pub to_time: Option<DateTime<Utc>>,
    /// `true` for oldest-first, `false` for newest-first.
    pub forward: bool,
    /// Each key must be present; when a value is given it must also match.
    pub search_keys: Vec<(String, Option<AuditValue>)>,
}

impl AuditQueryParameters {
    /// Parameters scoped to one application, oldest-first.
    #[must_use]
    pub fn for_application(application: impl Into<String>) -> Self {
        Self {
            application: Some(application.into()),
            forward: true,
            ..Self::default()
        }
    }

    /// Add a search key.
    pub fn add_search_key(&mut self, path: impl Into<String>, value: Option<AuditValue>) {
        self.search_keys.push((path.into(), value));
    }

    /// Check whether a stored entry satisfies every filter.
    #[must_use]
    pub fn matches(&self, entry: &StoredAuditEntry) -> bool {
        if self
            .application
            .as_ref()
            .is_some_and(|app| *app != entry.application)
        {
            return false;
        }
        if let Some(user) = &self.user
            && entry.user.as_deref() != Some(user.as_str())
        {
            return false;
        }
        if self.from_time.is_some_and(|from| entry.time < from) {
            return false;
        }
        if self.to_time.is_some_and(|to| entry.time >= to) {
            return false;
        }
        self.search_keys.iter().all(|(path, expected)| {
            match (entry.values.get(path), expected) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}
