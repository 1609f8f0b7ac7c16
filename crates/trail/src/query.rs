use chrono::{DateTime, Duration, NaiveTime, Utc};

use rmaudit_audit::{AuditQueryParameters, AuditValue};
use rmaudit_core::{NodeRef, QName};

use crate::events::{LOGIN_FAILURE, LOGIN_SUCCESS};
use crate::schema::{AuditSchema, paths};

/// Filters for an audit trail query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordsManagementAuditQueryParameters {
    pub user: Option<String>,
    pub node: Option<NodeRef>,
    /// Widened to the start of its day.
    pub date_from: Option<DateTime<Utc>>,
    /// Widened to the end of its day.
    pub date_to: Option<DateTime<Utc>>,
    pub event: Option<String>,
    /// Shown in report headers.
    pub property: Option<QName>,
    /// Maximum entries per audit application; `0` means unlimited. A limit
    /// returns the newest entries first.
    pub max_entries: usize,
}

impl RecordsManagementAuditQueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_node(mut self, node: NodeRef) -> Self {
        self.node = Some(node);
        self
    }

    #[must_use]
    pub fn with_date_from(mut self, date: DateTime<Utc>) -> Self {
        self.date_from = Some(date);
        self
    }

    #[must_use]
    pub fn with_date_to(mut self, date: DateTime<Utc>) -> Self {
        self.date_to = Some(date);
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: QName) -> Self {
        self.property = Some(property);
        self
    }

    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Generic query parameters for one schema.
    ///
    /// Event filters only apply to the current schema; the legacy schema is
    /// filtered by node alone.
    pub fn to_audit_query(&self, schema: AuditSchema) -> AuditQueryParameters {
        let mut query = AuditQueryParameters::for_application(schema.application());
        query.forward = self.max_entries == 0;
        query.user.clone_from(&self.user);
        query.from_time = self.date_from.map(start_of_day);
        query.to_time = self.date_to.map(end_of_day);

        if let Some(node) = &self.node {
            query.add_search_key(
                schema.path(paths::NODE_NODEREF),
                Some(AuditValue::from(node.clone())),
            );
        } else if schema == AuditSchema::Rm
            && let Some(event) = &self.event
        {
            if event.eq_ignore_ascii_case(LOGIN_SUCCESS) {
                query.add_search_key(schema.path(paths::LOGIN_FULL_NAME), None);
            } else if event.eq_ignore_ascii_case(LOGIN_FAILURE) {
                query.add_search_key(schema.path(paths::LOGIN_ERROR), None);
            } else {
                query.add_search_key(
                    schema.path(paths::EVENT_NAME),
                    Some(AuditValue::from(event.as_str())),
                );
            }
        }
        query
    }
}

/// Midnight at the start of `date`'s day.
pub fn start_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    date.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// The last millisecond of `date`'s day.
pub fn end_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}
