use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use rmaudit_audit::error::AuditError;
use rmaudit_audit::record::{AuditQueryParameters, AuditValues, StoredAuditEntry, build_path};
use rmaudit_audit::store::{AuditComponent, AuditQueryCallback, AuditWriteTxn};

/// A registered audit application.
#[derive(Debug, Clone)]
struct Application {
    /// Root path owned by the application, e.g. `/RM`.
    root_path: String,
    /// Paths (and their descendants) for which auditing is switched off.
    disabled_paths: Vec<String>,
}

impl Application {
    fn is_enabled(&self, path: &str) -> bool {
        !self
            .disabled_paths
            .iter()
            .any(|disabled| is_same_or_descendant(path, disabled))
    }
}

fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Debug, Default)]
struct Inner {
    /// Committed entries keyed by entry ID.
    entries: DashMap<u64, StoredAuditEntry>,
    /// Application name -> definition.
    applications: DashMap<String, Application>,
    next_id: AtomicU64,
}

impl Inner {
    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn application_for_root(&self, root_path: &str) -> Option<(String, Application)> {
        self.applications
            .iter()
            .find(|app| app.value().root_path == root_path)
            .map(|app| (app.key().clone(), app.value().clone()))
    }
}

/// In-memory audit component using `DashMap`. Suitable for development and
/// testing.
///
/// Applications must be registered before values recorded under their root
/// path are kept; values for unknown roots are silently not audited.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditComponent {
    inner: Arc<Inner>,
}

impl MemoryAuditComponent {
    /// Create a new component with no applications.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an application and return `self` for chaining.
    #[must_use]
    pub fn with_application(self, name: &str, root_path: &str) -> Self {
        self.register_application(name, root_path);
        self
    }

    /// Register (or re-register) an application, enabled.
    pub fn register_application(&self, name: &str, root_path: &str) {
        self.inner.applications.insert(
            name.to_owned(),
            Application {
                root_path: build_path(&[root_path]),
                disabled_paths: Vec::new(),
            },
        );
    }

    /// Insert an already-resolved entry, bypassing the enabled checks.
    ///
    /// Used to seed historic data such as legacy-schema or login entries.
    pub fn insert_entry(
        &self,
        application: &str,
        user: Option<&str>,
        time: DateTime<Utc>,
        values: AuditValues,
    ) -> u64 {
        let id = self.inner.allocate_id();
        self.inner.entries.insert(
            id,
            StoredAuditEntry {
                id,
                application: application.to_owned(),
                user: user.map(str::to_owned),
                time,
                values,
            },
        );
        id
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Snapshot of all committed entries, oldest first.
    pub fn entries(&self) -> Vec<StoredAuditEntry> {
        let mut entries: Vec<StoredAuditEntry> = self
            .inner
            .entries
            .iter()
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }
}

/// Values recorded in an open transaction, awaiting commit.
struct Staged {
    application: String,
    user: Option<String>,
    time: DateTime<Utc>,
    values: AuditValues,
}

/// Write transaction that buffers entries until commit.
struct MemoryWriteTxn {
    inner: Arc<Inner>,
    staged: Vec<Staged>,
}

#[async_trait]
impl AuditWriteTxn for MemoryWriteTxn {
    async fn record_audit_values(
        &mut self,
        root_path: &str,
        user: Option<&str>,
        values: AuditValues,
    ) -> Result<AuditValues, AuditError> {
        let root_path = build_path(&[root_path]);
        let Some((name, application)) = self.inner.application_for_root(&root_path) else {
            debug!(root_path = %root_path, "no audit application owns root path");
            return Ok(AuditValues::new());
        };

        let audited: AuditValues = values
            .into_iter()
            .filter_map(|(key, value)| {
                let full_path = build_path(&[&root_path, &key]);
                application
                    .is_enabled(&full_path)
                    .then_some((full_path, value))
            })
            .collect();

        if !audited.is_empty() {
            self.staged.push(Staged {
                application: name,
                user: user.map(str::to_owned),
                time: Utc::now(),
                values: audited.clone(),
            });
        }
        Ok(audited)
    }

    async fn commit(self: Box<Self>) -> Result<(), AuditError> {
        for staged in self.staged {
            let id = self.inner.allocate_id();
            self.inner.entries.insert(
                id,
                StoredAuditEntry {
                    id,
                    application: staged.application,
                    user: staged.user,
                    time: staged.time,
                    values: staged.values,
                },
            );
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AuditError> {
        debug!(discarded = self.staged.len(), "audit transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl AuditComponent for MemoryAuditComponent {
    async fn begin(&self) -> Result<Box<dyn AuditWriteTxn>, AuditError> {
        Ok(Box::new(MemoryWriteTxn {
            inner: Arc::clone(&self.inner),
            staged: Vec::new(),
        }))
    }

    async fn audit_query(
        &self,
        callback: &mut dyn AuditQueryCallback,
        params: &AuditQueryParameters,
        max_results: usize,
    ) -> Result<(), AuditError> {
        // Clone matches out so no map guard is held across the callback.
        let mut matching: Vec<StoredAuditEntry> = self
            .inner
            .entries
            .iter()
            .filter(|entry| params.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        if params.forward {
            matching.sort_by_key(|e| e.id);
        } else {
            matching.sort_by(|a, b| b.id.cmp(&a.id));
        }
        if max_results > 0 {
            matching.truncate(max_results);
        }

        let values_required = callback.values_required();
        for mut entry in matching {
            if !values_required {
                entry.values.clear();
            }
            if !callback.handle_audit_entry(&entry).await {
                break;
            }
        }
        Ok(())
    }

    async fn is_audit_enabled(&self, application: &str, path: &str) -> Result<bool, AuditError> {
        Ok(self
            .inner
            .applications
            .get(application)
            .is_some_and(|app| app.is_enabled(&build_path(&[path]))))
    }

    async fn enable_audit(&self, application: &str, path: &str) -> Result<(), AuditError> {
        let mut app = self
            .inner
            .applications
            .get_mut(application)
            .ok_or_else(|| AuditError::UnknownApplication(application.to_owned()))?;
        let path = build_path(&[path]);
        app.disabled_paths
            .retain(|disabled| !is_same_or_descendant(disabled, &path));
        Ok(())
    }

    async fn disable_audit(&self, application: &str, path: &str) -> Result<(), AuditError> {
        let mut app = self
            .inner
            .applications
            .get_mut(application)
            .ok_or_else(|| AuditError::UnknownApplication(application.to_owned()))?;
        let path = build_path(&[path]);
        if !app.disabled_paths.contains(&path) {
            app.disabled_paths.push(path);
        }
        Ok(())
    }

    async fn clear_audit(
        &self,
        application: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<u64, AuditError> {
        // Collect IDs to remove (cannot mutate while iterating DashMap).
        let doomed: Vec<u64> = self
            .inner
            .entries
            .iter()
            .filter(|entry| {
                let e = entry.value();
                e.application == application
                    && from.is_none_or(|from| e.time >= from)
                    && to.is_none_or(|to| e.time < to)
            })
            .map(|entry| *entry.key())
            .collect();

        let mut removed = 0u64;
        for id in doomed {
            if self.inner.entries.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use rmaudit_audit::error::AuditError;
    use rmaudit_audit::record::{AuditQueryParameters, AuditValues, StoredAuditEntry};
    use rmaudit_audit::store::{AuditComponent, AuditQueryCallback};

    use super::MemoryAuditComponent;

    /// Collects every entry it is handed, optionally stopping after `limit`.
    #[derive(Default)]
    struct Collect {
        seen: Vec<StoredAuditEntry>,
        limit: Option<usize>,
    }

    #[async_trait]
    impl AuditQueryCallback for Collect {
        async fn handle_audit_entry(&mut self, entry: &StoredAuditEntry) -> bool {
            self.seen.push(entry.clone());
            self.limit.is_none_or(|limit| self.seen.len() < limit)
        }
    }

    fn event_values(name: &str) -> AuditValues {
        let mut values = AuditValues::new();
        values.insert("/event/name".to_owned(), name.into());
        values
    }

    fn component() -> MemoryAuditComponent {
        MemoryAuditComponent::new().with_application("RM", "/RM")
    }

    #[tokio::test]
    async fn record_prefixes_root_path() {
        let audit = component();
        let audited = audit
            .record_audit_values("/RM", Some("alice"), event_values("Login"))
            .await
            .unwrap();

        assert!(audited.contains_key("/RM/event/name"));
        assert_eq!(audit.len(), 1);
        let stored = &audit.entries()[0];
        assert_eq!(stored.application, "RM");
        assert_eq!(stored.user.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn toggling_an_unknown_application_fails() {
        let audit = component();
        let err = audit.disable_audit("DOD5015", "/DOD5015").await.unwrap_err();
        assert!(matches!(err, AuditError::UnknownApplication(ref app) if app == "DOD5015"));
        assert!(matches!(
            audit.enable_audit("Other", "/Other").await,
            Err(AuditError::UnknownApplication(_))
        ));
    }

    #[tokio::test]
    async fn unknown_root_audits_nothing() {
        let audit = component();
        let audited = audit
            .record_audit_values("/Other", None, event_values("x"))
            .await
            .unwrap();
        assert!(audited.is_empty());
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn rollback_discards_staged_values() {
        let audit = component();
        let mut txn = audit.begin().await.unwrap();
        let audited = txn
            .record_audit_values("/RM", None, event_values("a"))
            .await
            .unwrap();
        assert!(!audited.is_empty());
        txn.rollback().await.unwrap();
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn staged_values_invisible_until_commit() {
        let audit = component();
        let mut txn = audit.begin().await.unwrap();
        txn.record_audit_values("/RM", None, event_values("a"))
            .await
            .unwrap();
        assert!(audit.is_empty());
        txn.commit().await.unwrap();
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn disable_and_enable_audit() {
        let audit = component();
        assert!(audit.is_audit_enabled("RM", "/RM").await.unwrap());

        audit.disable_audit("RM", "/RM").await.unwrap();
        assert!(!audit.is_audit_enabled("RM", "/RM").await.unwrap());
        assert!(!audit.is_audit_enabled("RM", "/RM/event").await.unwrap());
        let audited = audit
            .record_audit_values("/RM", None, event_values("a"))
            .await
            .unwrap();
        assert!(audited.is_empty());

        audit.enable_audit("RM", "/RM").await.unwrap();
        assert!(audit.is_audit_enabled("RM", "/RM").await.unwrap());
        assert!(!audit.is_audit_enabled("DOD5015", "/DOD5015").await.unwrap());
        assert!(audit.enable_audit("DOD5015", "/DOD5015").await.is_err());
    }

    #[tokio::test]
    async fn query_orders_and_limits() {
        let audit = component();
        for name in ["first", "second", "third"] {
            audit
                .record_audit_values("/RM", None, event_values(name))
                .await
                .unwrap();
        }

        let mut forward = Collect::default();
        let params = AuditQueryParameters::for_application("RM");
        audit.audit_query(&mut forward, &params, 0).await.unwrap();
        let names: Vec<_> = forward
            .seen
            .iter()
            .map(|e| e.values["/RM/event/name"].as_text().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);

        let mut backward = Collect::default();
        let params = AuditQueryParameters {
            forward: false,
            ..AuditQueryParameters::for_application("RM")
        };
        audit.audit_query(&mut backward, &params, 2).await.unwrap();
        assert_eq!(backward.seen.len(), 2);
        assert_eq!(
            backward.seen[0].values["/RM/event/name"].as_text(),
            Some("third")
        );
    }

    #[tokio::test]
    async fn callback_can_stop_query() {
        let audit = component();
        for name in ["a", "b", "c"] {
            audit
                .record_audit_values("/RM", None, event_values(name))
                .await
                .unwrap();
        }
        let mut stop_after_one = Collect {
            limit: Some(1),
            ..Collect::default()
        };
        audit
            .audit_query(
                &mut stop_after_one,
                &AuditQueryParameters::for_application("RM"),
                0,
            )
            .await
            .unwrap();
        assert_eq!(stop_after_one.seen.len(), 1);
    }

    #[tokio::test]
    async fn clear_audit_respects_window() {
        let audit = component();
        let now = Utc::now();
        audit.insert_entry("RM", None, now - Duration::days(2), event_values("old"));
        audit.insert_entry("RM", None, now, event_values("new"));
        audit.insert_entry("DOD5015", None, now, event_values("legacy"));

        let removed = audit
            .clear_audit("RM", None, Some(now - Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(audit.len(), 2);

        let removed = audit.clear_audit("RM", None, None).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(audit.entries()[0].application, "DOD5015");
    }

    #[tokio::test]
    async fn query_filters_on_search_key_value() {
        let audit = component();
        let node = rmaudit_core::NodeRef::in_spaces_store("n1");
        let mut values = event_values("Update");
        values.insert("/event/node".to_owned(), node.clone().into());
        audit.record_audit_values("/RM", None, values).await.unwrap();
        audit
            .record_audit_values("/RM", None, event_values("Other"))
            .await
            .unwrap();

        let mut params = AuditQueryParameters::for_application("RM");
        params.add_search_key("/RM/event/node", Some(node.into()));
        let mut collect = Collect::default();
        audit.audit_query(&mut collect, &params, 0).await.unwrap();
        assert_eq!(collect.seen.len(), 1);
    }
}
