use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::debug;

use rmaudit_audit::AuditComponent;
use rmaudit_repo::Repository;

use crate::config::AuditTrailConfig;
use crate::error::TrailError;
use crate::events::AuditEventRegistry;
use crate::messages::Messages;
use crate::service::RecordsManagementAuditService;

/// Fluent builder for a [`RecordsManagementAuditService`].
///
/// An audit component and a repository must be supplied. Configuration
/// defaults to [`AuditTrailConfig::default`].
#[derive(Default)]
pub struct RecordsManagementAuditServiceBuilder {
    audit: Option<Arc<dyn AuditComponent>>,
    repository: Option<Repository>,
    config: AuditTrailConfig,
    events: Vec<(String, String)>,
}

impl RecordsManagementAuditServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the audit component values are recorded through.
    #[must_use]
    pub fn audit(mut self, audit: Arc<dyn AuditComponent>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Set the repository collaborators.
    #[must_use]
    pub fn repository(mut self, repository: Repository) -> Self {
        self.repository = Some(repository);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AuditTrailConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an audit event up front.
    #[must_use]
    pub fn event(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.events.push((name.into(), label.into()));
        self
    }

    /// Build the service.
    ///
    /// Fails when a collaborator is missing or an ignored property name
    /// cannot be resolved.
    pub fn build(self) -> Result<RecordsManagementAuditService, TrailError> {
        let audit = self
            .audit
            .ok_or_else(|| TrailError::Configuration("audit component is required".into()))?;
        let repo = self
            .repository
            .ok_or_else(|| TrailError::Configuration("repository is required".into()))?;

        let namespaces = self.config.namespace_registry();
        let ignored = self.config.ignored_properties(&namespaces)?;
        debug!(
            ignored = ?ignored.iter().map(|q| namespaces.prefixed(q)).collect::<Vec<_>>(),
            "properties excluded from records management audit"
        );

        let messages = Messages::new(self.config.messages.clone());
        let events = AuditEventRegistry::with_builtins(&messages);
        for (name, label) in &self.events {
            events.register(name, label);
        }

        Ok(RecordsManagementAuditService {
            audit,
            repo,
            config: self.config,
            ignored,
            messages,
            events,
            shutdown: AtomicBool::new(false),
        })
    }
}
