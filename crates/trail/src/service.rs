use std::collections::BTreeSet;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{Level, debug, info, warn};

use rmaudit_audit::{
    AuditComponent, AuditQueryCallback, AuditValue, AuditValues, AuditWriteTxn, StoredAuditEntry,
};
use rmaudit_core::model::{
    PROP_AUTHORITY_DISPLAY_NAME, PROP_AUTHORITY_NAME, PROP_IDENTIFIER, PROP_NAME,
    PROP_PARENT_GROUP, PROP_USERNAME, TYPE_DOD_5015_SITE,
};
use rmaudit_core::{Actor, NodeRef, PropertyMap, PropertyValue, QName};
use rmaudit_repo::{PropertyDefinition, Repository};

use crate::builder::RecordsManagementAuditServiceBuilder;
use crate::config::AuditTrailConfig;
use crate::diff::{changes_only, strip_ignored};
use crate::entry::RecordsManagementAuditEntry;
use crate::error::TrailError;
use crate::events::{
    AUDIT_EVENT_CLEAR, AUDIT_EVENT_START, AUDIT_EVENT_STOP, AUDIT_EVENT_VIEW, AuditEvent,
    AuditEventRegistry, EVENT_ADD_TO_USER_GROUP, EVENT_CREATE_PERSON, EVENT_CREATE_USER_GROUP,
    EVENT_DELETE_HOLD, EVENT_DELETE_PERSON, EVENT_DELETE_RM_OBJECT, EVENT_DELETE_USER_GROUP,
    EVENT_REMOVE_FROM_USER_GROUP,
};
use crate::messages::{MSG_AUDIT_REPORT, MSG_HOLD_PERMISSION_DENIED, Messages};
use crate::query::{RecordsManagementAuditQueryParameters, end_of_day, start_of_day};
use crate::render::{ChangedValue, EntryView, NodeLink, ReportFormat, ReportHeader, ReportWriter};
use crate::schema::{AuditSchema, paths};
use crate::txn::{AuditOptions, AuditTransaction, FlushReport, PendingAuditRecord};
use crate::visibility::{can_view_node, redact_hold_name, strip_hold_refs};

const TRAIL_FILE_PREFIX: &str = "audit_";

/// Records, queries and reports the records-management audit trail.
pub struct RecordsManagementAuditService {
    pub(crate) audit: Arc<dyn AuditComponent>,
    pub(crate) repo: Repository,
    pub(crate) config: AuditTrailConfig,
    pub(crate) ignored: BTreeSet<QName>,
    pub(crate) messages: Messages,
    pub(crate) events: AuditEventRegistry,
    pub(crate) shutdown: AtomicBool,
}

impl RecordsManagementAuditService {
    pub fn builder() -> RecordsManagementAuditServiceBuilder {
        RecordsManagementAuditServiceBuilder::new()
    }

    pub fn config(&self) -> &AuditTrailConfig {
        &self.config
    }

    // ---- Recording ----

    /// Audit an event on `node`.
    ///
    /// Immediate events are recorded straight away; others are buffered in
    /// `txn` until [`commit`](Self::commit). A repeated buffered (node,
    /// event) pair keeps its first `before` map and takes the new `after`.
    pub async fn audit_event(
        &self,
        txn: &mut AuditTransaction,
        node: &NodeRef,
        event: &str,
        mut before: PropertyMap,
        mut after: PropertyMap,
        options: AuditOptions,
    ) -> Result<(), TrailError> {
        if options.immediate {
            self.audit_now(
                txn.actor(),
                node,
                event,
                before,
                after,
                options.remove_if_no_property_changed,
            )
            .await?;
            return Ok(());
        }

        strip_ignored(&mut before, &self.ignored);
        strip_ignored(&mut after, &self.ignored);
        txn.record(
            node,
            event,
            before,
            after,
            options.remove_if_no_property_changed,
        );
        Ok(())
    }

    /// Buffer an event without property changes.
    pub async fn audit_simple_event(
        &self,
        txn: &mut AuditTransaction,
        node: &NodeRef,
        event: &str,
    ) -> Result<(), TrailError> {
        self.audit_event(
            txn,
            node,
            event,
            PropertyMap::new(),
            PropertyMap::new(),
            AuditOptions::default(),
        )
        .await
    }

    /// Buffer an event, merging both maps key by key into an already
    /// buffered record for the same (node, event) pair.
    pub fn audit_or_update_event(
        &self,
        txn: &mut AuditTransaction,
        node: &NodeRef,
        event: &str,
        mut before: PropertyMap,
        mut after: PropertyMap,
        remove_if_no_property_changed: bool,
    ) {
        strip_ignored(&mut before, &self.ignored);
        strip_ignored(&mut after, &self.ignored);
        txn.record_or_merge(node, event, before, after, remove_if_no_property_changed);
    }

    /// Flush everything buffered in `txn` in a fresh audit write
    /// transaction.
    ///
    /// The flush transaction is rolled back when nothing was audited.
    pub async fn commit(&self, mut txn: AuditTransaction) -> Result<FlushReport, TrailError> {
        let records = txn.take_records();
        if records.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut flush = self.audit.begin().await?;
        match self
            .flush_records(&mut *flush, txn.actor(), records)
            .await
        {
            Ok(report) if report.audited == 0 => {
                debug!(skipped = report.skipped, "RM audit: nothing was audited");
                flush.rollback().await?;
                Ok(report)
            }
            Ok(report) => {
                flush.commit().await?;
                debug!(
                    audited = report.audited,
                    skipped = report.skipped,
                    "RM audit: flushed transaction"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback) = flush.rollback().await {
                    warn!(error = %rollback, "failed to roll back audit flush");
                }
                Err(e)
            }
        }
    }

    async fn flush_records(
        &self,
        flush: &mut dyn AuditWriteTxn,
        actor: &Actor,
        records: Vec<PendingAuditRecord>,
    ) -> Result<FlushReport, TrailError> {
        let mut report = FlushReport::default();
        for record in records {
            if !self.repo.nodes.exists(&record.node).await? {
                debug!(node = %record.node, event = %record.event, "RM audit: node is gone, skipping");
                report.skipped += 1;
                continue;
            }

            let values = self
                .build_audit_map(
                    actor,
                    &record.node,
                    &record.event,
                    record.before,
                    record.after,
                    record.remove_if_no_property_changed,
                )
                .await?;
            if values.is_empty() {
                report.skipped += 1;
                continue;
            }

            debug!(values = ?values, "RM audit: auditing values");
            let audited = flush
                .record_audit_values(
                    AuditSchema::Rm.root(),
                    Some(actor.user_name.as_str()),
                    values,
                )
                .await?;
            if audited.is_empty() {
                debug!(node = %record.node, "RM audit: nothing was audited");
                report.skipped += 1;
            } else {
                report.audited += 1;
            }
        }
        Ok(report)
    }

    /// Record an event immediately. Returns whether anything was audited.
    async fn audit_now(
        &self,
        actor: &Actor,
        node: &NodeRef,
        event: &str,
        before: PropertyMap,
        after: PropertyMap,
        remove_if_no_property_changed: bool,
    ) -> Result<bool, TrailError> {
        let values = self
            .build_audit_map(
                actor,
                node,
                event,
                before,
                after,
                remove_if_no_property_changed,
            )
            .await?;
        if values.is_empty() {
            return Ok(false);
        }
        let audited = self
            .audit
            .record_audit_values(AuditSchema::Rm.root(), Some(actor.user_name.as_str()), values)
            .await?;
        Ok(!audited.is_empty())
    }

    /// The values recorded for one event, relative to the `/RM` root.
    ///
    /// Empty when no property changed and the record asks to be dropped in
    /// that case.
    async fn build_audit_map(
        &self,
        actor: &Actor,
        node: &NodeRef,
        event: &str,
        mut before: PropertyMap,
        mut after: PropertyMap,
        remove_if_no_property_changed: bool,
    ) -> Result<AuditValues, TrailError> {
        strip_ignored(&mut before, &self.ignored);
        strip_ignored(&mut after, &self.ignored);
        let (before, after) = changes_only(&before, &after);
        if before.is_empty() && after.is_empty() && remove_if_no_property_changed {
            debug!(node = %node, event, "RM audit: no property changed, dropping event");
            return Ok(AuditValues::new());
        }

        let mut values = AuditValues::new();
        values.insert(paths::EVENT_NAME.to_owned(), AuditValue::from(event));
        values.insert(
            paths::NODE_NODEREF.to_owned(),
            AuditValue::from(node.clone()),
        );
        if let Some(full_name) = &actor.full_name {
            values.insert(
                paths::PERSON_FULL_NAME.to_owned(),
                AuditValue::from(full_name.as_str()),
            );
        }
        if let Some(roles) = &actor.roles {
            values.insert(
                paths::PERSON_ROLES.to_owned(),
                AuditValue::from(roles.as_str()),
            );
        }

        let nodes = &self.repo.nodes;
        if nodes.exists(node).await? {
            if let Some(name) = nodes.get_property(node, &PROP_NAME).await?
                && !name.is_null()
            {
                values.insert(
                    paths::NODE_NAME.to_owned(),
                    AuditValue::from(name.to_string()),
                );
            }
            if let Some(node_type) = nodes.node_type(node).await? {
                values.insert(paths::NODE_TYPE.to_owned(), AuditValue::from(node_type));
            }
            if let Some(identifier) = nodes.get_property(node, &PROP_IDENTIFIER).await?
                && !identifier.is_null()
            {
                values.insert(
                    paths::NODE_IDENTIFIER.to_owned(),
                    AuditValue::from(identifier.to_string()),
                );
            }
            if let Some(path) = nodes.display_path(node).await? {
                values.insert(paths::NODE_NAME_PATH.to_owned(), AuditValue::from(path));
            }
        }

        values.insert(
            paths::NODE_CHANGES_BEFORE.to_owned(),
            AuditValue::from(before),
        );
        values.insert(
            paths::NODE_CHANGES_AFTER.to_owned(),
            AuditValue::from(after),
        );
        Ok(values)
    }

    // ---- Querying ----

    /// Entries matching `params` that `viewer` may see.
    pub async fn get_audit_trail(
        &self,
        viewer: &Actor,
        params: &RecordsManagementAuditQueryParameters,
    ) -> Result<Vec<RecordsManagementAuditEntry>, TrailError> {
        let mut entries = Vec::new();
        self.query_trail::<io::Sink>(viewer, params, Some(&mut entries), None)
            .await?;
        Ok(entries)
    }

    /// Stream a report for `params` to `out` and hand the writer back.
    pub async fn write_audit_trail<W: Write + Send>(
        &self,
        viewer: &Actor,
        params: &RecordsManagementAuditQueryParameters,
        format: ReportFormat,
        out: W,
    ) -> Result<W, TrailError> {
        let mut writer = ReportWriter::new(out, format)?;
        self.query_trail(viewer, params, None, Some(&mut writer))
            .await?;
        writer.finish()
    }

    /// Write a report to a new `audit_*` file in the configured directory.
    pub async fn get_audit_trail_file(
        &self,
        viewer: &Actor,
        params: &RecordsManagementAuditQueryParameters,
        format: ReportFormat,
    ) -> Result<PathBuf, TrailError> {
        let suffix = format!(".{}", format.extension());
        let file = tempfile::Builder::new()
            .prefix(TRAIL_FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(self.config.trail_file_dir())?;
        let (file, path) = file.keep().map_err(|e| TrailError::from(e.error))?;

        if let Err(e) = self
            .write_audit_trail(viewer, params, format, BufWriter::new(file))
            .await
        {
            remove_trail_file(&path);
            return Err(e);
        }
        Ok(path)
    }

    /// Write a report and store it as content under `destination`.
    ///
    /// The intermediate file is deleted unless debug logging is enabled.
    pub async fn file_audit_trail_as_record(
        &self,
        viewer: &Actor,
        params: &RecordsManagementAuditQueryParameters,
        destination: &NodeRef,
        format: ReportFormat,
    ) -> Result<NodeRef, TrailError> {
        let path = self.get_audit_trail_file(viewer, params, format).await?;
        debug!(
            path = %path.display(),
            destination = %destination,
            "filing audit trail as a record"
        );

        let record = self.store_trail_file(&path, destination, format).await;
        if tracing::enabled!(Level::DEBUG) {
            debug!(path = %path.display(), "audit trail report saved to temporary file");
        } else {
            remove_trail_file(&path);
        }
        record
    }

    async fn store_trail_file(
        &self,
        path: &Path,
        destination: &NodeRef,
        format: ReportFormat,
    ) -> Result<NodeRef, TrailError> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = self
            .repo
            .nodes
            .create_content(destination, &name, format.mimetype(), content)
            .await?;
        Ok(record)
    }

    async fn query_trail<W: Write + Send>(
        &self,
        viewer: &Actor,
        params: &RecordsManagementAuditQueryParameters,
        results: Option<&mut Vec<RecordsManagementAuditEntry>>,
        mut writer: Option<&mut ReportWriter<W>>,
    ) -> Result<(), TrailError> {
        debug!(
            params = ?params,
            format = ?writer.as_ref().map(|w| w.format()),
            "retrieving audit trail"
        );

        if let Some(writer) = writer.as_deref_mut() {
            let header = self.report_header(params).await?;
            writer.write_header(&header)?;
        }

        {
            let mut callback = TrailCallback {
                service: self,
                viewer,
                results,
                writer: writer.as_deref_mut(),
                error: None,
            };

            if self.default_site_is_dod5015().await? {
                self.audit
                    .audit_query(
                        &mut callback,
                        &params.to_audit_query(AuditSchema::Dod5015),
                        params.max_entries,
                    )
                    .await?;
            }
            // The current schema is always queried, whatever the site type.
            if callback.error.is_none() {
                self.audit
                    .audit_query(
                        &mut callback,
                        &params.to_audit_query(AuditSchema::Rm),
                        params.max_entries,
                    )
                    .await?;
            }
            if let Some(e) = callback.error.take() {
                return Err(e);
            }
        }

        if let Some(writer) = writer.as_deref_mut() {
            writer.write_footer()?;
        }

        let target = match &params.node {
            Some(node) => Some(node.clone()),
            None => self.default_file_plan().await?,
        };
        match target {
            Some(node) => {
                if let Err(e) = self
                    .audit_now(
                        viewer,
                        &node,
                        AUDIT_EVENT_VIEW,
                        PropertyMap::new(),
                        PropertyMap::new(),
                        false,
                    )
                    .await
                {
                    warn!(error = %e, node = %node, "failed to audit trail view");
                }
            }
            None => debug!("no default file plan, trail view not audited"),
        }
        Ok(())
    }

    async fn report_header(
        &self,
        params: &RecordsManagementAuditQueryParameters,
    ) -> Result<ReportHeader, TrailError> {
        let now = Utc::now();
        let property = match &params.property {
            Some(property) => Some(self.property_label(property).await?),
            None => None,
        };
        let enabled = match self.default_file_plan().await? {
            Some(file_plan) => self.is_audit_log_enabled(&file_plan).await?,
            None => false,
        };
        Ok(ReportHeader {
            title: self.messages.get(MSG_AUDIT_REPORT),
            date_from: params.date_from,
            date_to: params.date_to,
            property,
            user: params.user.clone(),
            event: params.event.as_deref().map(|e| self.events.label(e)),
            started: start_of_day(params.date_from.unwrap_or(now)),
            stopped: end_of_day(params.date_to.unwrap_or(now)),
            enabled,
        })
    }

    async fn default_site_is_dod5015(&self) -> Result<bool, TrailError> {
        let site_type = self
            .repo
            .sites
            .site_type(&self.config.default_site_id)
            .await?;
        Ok(site_type.as_ref() == Some(&TYPE_DOD_5015_SITE))
    }

    /// Decode, filter and emit one stored entry.
    async fn process_entry<W: Write + Send>(
        &self,
        viewer: &Actor,
        stored: &StoredAuditEntry,
        results: Option<&mut Vec<RecordsManagementAuditEntry>>,
        writer: Option<&mut ReportWriter<W>>,
    ) -> Result<(), TrailError> {
        let Some(decoded) = AuditSchema::decode_any(stored) else {
            warn!(
                entry_id = stored.id,
                application = %stored.application,
                values = ?stored.values,
                "unable to process audit entry for RM, unexpected data"
            );
            return Ok(());
        };
        let (mut entry, node_type) = decoded.into_parts();

        if let Some(node) = entry.node.clone()
            && self.repo.nodes.exists(&node).await?
        {
            if !can_view_node(&self.repo, viewer, &node).await? {
                debug!(entry_id = stored.id, node = %node, "audit entry hidden from viewer");
                return Ok(());
            }
            let placeholder = self.messages.get(MSG_HOLD_PERMISSION_DENIED);
            let (before, after) = entry.properties_mut();
            redact_hold_name(&self.repo, viewer, &placeholder, before).await?;
            redact_hold_name(&self.repo, viewer, &placeholder, after).await?;
        }

        let (before, after) = entry.properties_mut();
        strip_hold_refs(before);
        strip_hold_refs(after);

        if let Some(node_type) = node_type {
            entry.node_type = self.repo.dictionary.type_title(&node_type).await?;
        }

        if let Some(writer) = writer {
            let view = self.describe_entry(&entry).await?;
            writer.write_entry(&view)?;
        }
        debug!(entry_id = stored.id, event = ?entry.event, "audit entry");
        if let Some(results) = results {
            results.push(entry);
        }
        Ok(())
    }

    // ---- Rendering helpers ----

    /// Display label of a property: its dictionary title, else its local
    /// name.
    pub async fn property_label(&self, property: &QName) -> Result<String, TrailError> {
        let definition = self.repo.dictionary.property(property).await?;
        Ok(label_for(property, definition.as_ref()))
    }

    /// Resolve every label of `entry` for writing.
    pub async fn describe_entry(
        &self,
        entry: &RecordsManagementAuditEntry,
    ) -> Result<EntryView, TrailError> {
        let (node_name, link) = self.node_name_and_link(entry).await?;

        let mut changes = Vec::new();
        for change in entry.changed_properties() {
            let definition = self.repo.dictionary.property(&change.name).await?;
            changes.push(ChangedValue {
                name: label_for(&change.name, definition.as_ref()),
                previous: display_value(change.before.as_ref(), definition.as_ref()),
                new: display_value(change.after.as_ref(), definition.as_ref()),
            });
        }

        Ok(EntryView {
            timestamp: entry.timestamp,
            user_name: entry.user_name.clone(),
            full_name: entry.full_name.clone(),
            user_role: entry.user_role.clone(),
            node: entry.node.clone(),
            node_name,
            link,
            node_type: entry.node_type.clone(),
            event: entry.event.as_deref().map(|e| self.events.label(e)),
            identifier: entry.identifier.clone(),
            path: entry.path.clone(),
            changes,
        })
    }

    /// Name shown for an entry's node. Person and group events name the
    /// authority, taken from the recorded properties.
    async fn node_name_and_link(
        &self,
        entry: &RecordsManagementAuditEntry,
    ) -> Result<(Option<String>, NodeLink), TrailError> {
        let Some(node) = &entry.node else {
            return Ok((None, NodeLink::Node));
        };

        let resolved = match entry.event.as_deref().unwrap_or_default() {
            EVENT_CREATE_PERSON => {
                let mut name = first_text(entry.after(), &[PROP_USERNAME]);
                // Older events were recorded without the user name.
                if name.is_none() && self.repo.nodes.exists(node).await? {
                    name = self
                        .repo
                        .nodes
                        .get_property(node, &PROP_USERNAME)
                        .await?
                        .and_then(|v| v.as_text().map(str::to_owned));
                }
                (name, NodeLink::CreatePerson)
            }
            EVENT_DELETE_PERSON => (
                first_text(entry.before(), &[PROP_USERNAME]),
                NodeLink::Unavailable,
            ),
            EVENT_CREATE_USER_GROUP => (
                first_text(
                    entry.after(),
                    &[PROP_AUTHORITY_DISPLAY_NAME, PROP_AUTHORITY_NAME],
                ),
                NodeLink::Unavailable,
            ),
            EVENT_DELETE_USER_GROUP => (
                first_text(
                    entry.before(),
                    &[PROP_AUTHORITY_DISPLAY_NAME, PROP_AUTHORITY_NAME],
                ),
                NodeLink::Unavailable,
            ),
            EVENT_ADD_TO_USER_GROUP => (
                first_text(entry.after(), &[PROP_PARENT_GROUP]),
                NodeLink::Unavailable,
            ),
            EVENT_REMOVE_FROM_USER_GROUP => (
                first_text(entry.before(), &[PROP_PARENT_GROUP]),
                NodeLink::Unavailable,
            ),
            EVENT_DELETE_RM_OBJECT | EVENT_DELETE_HOLD => {
                (entry.node_name.clone(), NodeLink::Unavailable)
            }
            _ => (entry.node_name.clone(), NodeLink::Node),
        };
        Ok(resolved)
    }

    // ---- Audit log control ----

    pub async fn is_audit_log_enabled(&self, file_plan: &NodeRef) -> Result<bool, TrailError> {
        debug!(file_plan = %file_plan, "checking records management audit state");
        Ok(self
            .audit
            .is_audit_enabled(AuditSchema::Rm.application(), AuditSchema::Rm.root())
            .await?)
    }

    /// Switch auditing on, then audit the start.
    pub async fn start_audit_log(
        &self,
        actor: &Actor,
        file_plan: &NodeRef,
    ) -> Result<(), TrailError> {
        self.audit
            .enable_audit(AuditSchema::Rm.application(), AuditSchema::Rm.root())
            .await?;
        info!(file_plan = %file_plan, "started records management auditing");
        self.audit_now(
            actor,
            file_plan,
            AUDIT_EVENT_START,
            PropertyMap::new(),
            PropertyMap::new(),
            false,
        )
        .await?;
        Ok(())
    }

    /// Audit the stop, then switch auditing off.
    pub async fn stop_audit_log(&self, actor: &Actor, file_plan: &NodeRef) -> Result<(), TrailError> {
        self.audit_now(
            actor,
            file_plan,
            AUDIT_EVENT_STOP,
            PropertyMap::new(),
            PropertyMap::new(),
            false,
        )
        .await?;
        self.audit
            .disable_audit(AuditSchema::Rm.application(), AuditSchema::Rm.root())
            .await?;
        info!(file_plan = %file_plan, "stopped records management auditing");
        Ok(())
    }

    /// Delete every records-management entry, then audit the clear.
    pub async fn clear_audit_log(
        &self,
        actor: &Actor,
        file_plan: &NodeRef,
    ) -> Result<(), TrailError> {
        let cleared = self
            .audit
            .clear_audit(AuditSchema::Rm.application(), None, None)
            .await?;
        info!(file_plan = %file_plan, cleared, "records management audit log has been cleared");
        self.audit_now(
            actor,
            file_plan,
            AUDIT_EVENT_CLEAR,
            PropertyMap::new(),
            PropertyMap::new(),
            false,
        )
        .await?;
        Ok(())
    }

    /// Start of today.
    #[allow(clippy::unused_self)]
    pub fn date_audit_log_last_started(&self, _file_plan: &NodeRef) -> DateTime<Utc> {
        start_of_day(Utc::now())
    }

    /// End of today.
    #[allow(clippy::unused_self)]
    pub fn date_audit_log_last_stopped(&self, _file_plan: &NodeRef) -> DateTime<Utc> {
        end_of_day(Utc::now())
    }

    // ---- Default file plan ----

    /// File plan of the default records-management site, if any.
    pub async fn default_file_plan(&self) -> Result<Option<NodeRef>, TrailError> {
        Ok(self
            .repo
            .file_plans
            .file_plan_by_site_id(&self.config.default_site_id)
            .await?)
    }

    async fn require_default_file_plan(&self) -> Result<NodeRef, TrailError> {
        self.default_file_plan()
            .await?
            .ok_or_else(|| TrailError::DefaultFilePlanMissing(self.config.default_site_id.clone()))
    }

    pub async fn is_enabled(&self) -> Result<bool, TrailError> {
        let file_plan = self.require_default_file_plan().await?;
        self.is_audit_log_enabled(&file_plan).await
    }

    pub async fn start(&self, actor: &Actor) -> Result<(), TrailError> {
        let file_plan = self.require_default_file_plan().await?;
        self.start_audit_log(actor, &file_plan).await
    }

    pub async fn stop(&self, actor: &Actor) -> Result<(), TrailError> {
        let file_plan = self.require_default_file_plan().await?;
        self.stop_audit_log(actor, &file_plan).await
    }

    pub async fn clear(&self, actor: &Actor) -> Result<(), TrailError> {
        let file_plan = self.require_default_file_plan().await?;
        self.clear_audit_log(actor, &file_plan).await
    }

    // ---- Event registry ----

    pub fn register_audit_event(&self, name: &str, label: &str) {
        self.events.register(name, label);
    }

    /// Registered events, sorted by label.
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.events.events()
    }

    // ---- Lifecycle ----

    pub fn on_bootstrap(&self) {
        self.shutdown.store(false, Ordering::SeqCst);
    }

    /// Ask running queries to stop at their next entry.
    pub fn on_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

fn label_for(property: &QName, definition: Option<&PropertyDefinition>) -> String {
    definition
        .and_then(|d| d.title.clone())
        .unwrap_or_else(|| property.local_name().to_owned())
}

/// Display form of a property value. Multilingual properties show their
/// default-locale text.
fn display_value(
    value: Option<&PropertyValue>,
    definition: Option<&PropertyDefinition>,
) -> Option<String> {
    match value? {
        PropertyValue::Null => None,
        PropertyValue::MlText(text) if definition.is_some_and(PropertyDefinition::is_mltext) => {
            Some(text.default_value().unwrap_or_default().to_owned())
        }
        other => Some(other.to_string()),
    }
}

/// First non-blank text among `names`.
fn first_text(properties: &PropertyMap, names: &[QName]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| properties.get(name).and_then(PropertyValue::as_text))
        .find(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

fn remove_trail_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove audit trail file");
    }
}

/// Query callback feeding decoded entries to a result list and/or a report.
struct TrailCallback<'a, W: Write> {
    service: &'a RecordsManagementAuditService,
    viewer: &'a Actor,
    results: Option<&'a mut Vec<RecordsManagementAuditEntry>>,
    writer: Option<&'a mut ReportWriter<W>>,
    /// First failure; stops the query.
    error: Option<TrailError>,
}

#[async_trait]
impl<'a, W: Write + Send> AuditQueryCallback for TrailCallback<'a, W> {
    async fn handle_audit_entry(&mut self, entry: &StoredAuditEntry) -> bool {
        if self.service.is_shutting_down() {
            return false;
        }
        let result = self
            .service
            .process_entry(
                self.viewer,
                entry,
                self.results.as_deref_mut(),
                self.writer.as_deref_mut(),
            )
            .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }
}
