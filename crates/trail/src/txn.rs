//! Transaction-scoped buffering of audit events.

use tracing::debug;

use rmaudit_core::{Actor, NodeRef, PropertyMap};

/// How a single audit call is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditOptions {
    /// Record straight away instead of waiting for the transaction to commit.
    pub immediate: bool,
    /// Drop the record when no property changed.
    pub remove_if_no_property_changed: bool,
}

impl AuditOptions {
    #[must_use]
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    #[must_use]
    pub fn remove_if_no_property_changed(mut self) -> Self {
        self.remove_if_no_property_changed = true;
        self
    }
}

/// An event buffered against a transaction, awaiting commit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAuditRecord {
    pub node: NodeRef,
    pub event: String,
    /// State before the transaction first touched the node for this event.
    pub before: PropertyMap,
    /// Latest known state.
    pub after: PropertyMap,
    pub remove_if_no_property_changed: bool,
}

/// The audit side of one unit of work.
///
/// Buffered events are flushed by
/// [`RecordsManagementAuditService::commit`](crate::RecordsManagementAuditService::commit).
/// Dropping the transaction without committing discards them.
#[derive(Debug)]
pub struct AuditTransaction {
    actor: Actor,
    records: Vec<PendingAuditRecord>,
}

impl AuditTransaction {
    /// Start a transaction on behalf of `actor`.
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            records: Vec::new(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Records buffered so far, in first-touch order.
    pub fn records(&self) -> &[PendingAuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn find_mut(&mut self, node: &NodeRef, event: &str) -> Option<&mut PendingAuditRecord> {
        self.records
            .iter_mut()
            .find(|r| r.node == *node && r.event == event)
    }

    /// Buffer an event. A repeated (node, event) pair only replaces the
    /// buffered `after` map.
    pub(crate) fn record(
        &mut self,
        node: &NodeRef,
        event: &str,
        before: PropertyMap,
        after: PropertyMap,
        remove_if_no_property_changed: bool,
    ) {
        if let Some(existing) = self.find_mut(node, event) {
            existing.after = after;
            return;
        }
        self.push(node, event, before, after, remove_if_no_property_changed);
    }

    /// Buffer an event. A repeated (node, event) pair merges both maps into
    /// the buffered record key by key.
    pub(crate) fn record_or_merge(
        &mut self,
        node: &NodeRef,
        event: &str,
        before: PropertyMap,
        after: PropertyMap,
        remove_if_no_property_changed: bool,
    ) {
        if let Some(existing) = self.find_mut(node, event) {
            existing.before.extend(before);
            existing.after.extend(after);
            return;
        }
        self.push(node, event, before, after, remove_if_no_property_changed);
    }

    fn push(
        &mut self,
        node: &NodeRef,
        event: &str,
        before: PropertyMap,
        after: PropertyMap,
        remove_if_no_property_changed: bool,
    ) {
        self.records.push(PendingAuditRecord {
            node: node.clone(),
            event: event.to_owned(),
            before,
            after,
            remove_if_no_property_changed,
        });
    }

    pub(crate) fn take_records(&mut self) -> Vec<PendingAuditRecord> {
        std::mem::take(&mut self.records)
    }
}

impl Drop for AuditTransaction {
    fn drop(&mut self) {
        if !self.records.is_empty() {
            debug!(
                user = %self.actor.user_name,
                discarded = self.records.len(),
                "audit transaction dropped without commit"
            );
        }
    }
}

/// Outcome of flushing a transaction's buffered events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Records written to the audit log.
    pub audited: usize,
    /// Records skipped: node gone, nothing changed, or auditing disabled.
    pub skipped: usize,
}
