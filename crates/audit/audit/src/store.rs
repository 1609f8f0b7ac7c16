use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::AuditError;
use crate::record::{AuditQueryParameters, AuditValues, StoredAuditEntry};

/// Visitor invoked once per entry produced by [`AuditComponent::audit_query`].
#[async_trait]
pub trait AuditQueryCallback: Send {
    /// Whether the component must populate [`StoredAuditEntry::values`].
    fn values_required(&self) -> bool {
        true
    }

    /// Handle one entry. Returning `false` stops the query early.
    async fn handle_audit_entry(&mut self, entry: &StoredAuditEntry) -> bool;

    /// Handle an entry the component could not load. Returning `false`
    /// stops the query early.
    fn handle_audit_entry_error(&mut self, entry_id: u64, message: &str) -> bool {
        warn!(entry_id, message, "audit entry could not be loaded");
        true
    }
}

/// A unit of work against the audit component.
///
/// Values recorded through the transaction become visible to queries only
/// after [`AuditWriteTxn::commit`]. Dropping the transaction discards them.
#[async_trait]
pub trait AuditWriteTxn: Send {
    /// Record values under an application root path such as `/RM`.
    ///
    /// `values` are keyed relative to the root (`/event/name`, ...). Returns
    /// the full-path values that were actually audited, which is empty when
    /// no enabled application owns the root path.
    async fn record_audit_values(
        &mut self,
        root_path: &str,
        user: Option<&str>,
        values: AuditValues,
    ) -> Result<AuditValues, AuditError>;

    /// Make everything recorded in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), AuditError>;

    /// Discard everything recorded in this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), AuditError>;
}

/// Trait for generic, path-keyed audit storage.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait AuditComponent: Send + Sync {
    /// Start a new write transaction.
    async fn begin(&self) -> Result<Box<dyn AuditWriteTxn>, AuditError>;

    /// Record values in a transaction of their own.
    async fn record_audit_values(
        &self,
        root_path: &str,
        user: Option<&str>,
        values: AuditValues,
    ) -> Result<AuditValues, AuditError> {
        let mut txn = self.begin().await?;
        let audited = txn.record_audit_values(root_path, user, values).await?;
        txn.commit().await?;
        Ok(audited)
    }

    /// Stream matching entries to `callback`.
    ///
    /// A `max_results` of zero means unlimited.
    async fn audit_query(
        &self,
        callback: &mut dyn AuditQueryCallback,
        params: &AuditQueryParameters,
        max_results: usize,
    ) -> Result<(), AuditError>;

    /// Whether auditing is enabled for `path` within `application`.
    async fn is_audit_enabled(&self, application: &str, path: &str) -> Result<bool, AuditError>;

    /// Enable auditing for `path` within `application`.
    async fn enable_audit(&self, application: &str, path: &str) -> Result<(), AuditError>;

    /// Disable auditing for `path` within `application`.
    async fn disable_audit(&self, application: &str, path: &str) -> Result<(), AuditError>;

    /// Delete entries of `application` recorded in `[from, to)`. Returns the
    /// number of entries deleted.
    async fn clear_audit(
        &self,
        application: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<u64, AuditError>;
}
