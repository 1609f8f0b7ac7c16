#![allow(dead_code)]

use std::sync::Arc;

use rmaudit_audit_memory::MemoryAuditComponent;
use rmaudit_core::model::{CONTENT_MODEL_URI, TYPE_FOLDER, TYPE_RM_SITE};
use rmaudit_core::{Actor, NodeRef, PropertyMap, PropertyValue, QName};
use rmaudit_repo::Repository;
use rmaudit_repo_memory::MemoryRepository;
use rmaudit_trail::{
    AuditOptions, AuditTrailConfig, AuditTransaction, RecordsManagementAuditQueryParameters,
    RecordsManagementAuditService,
};

pub struct Fixture {
    pub audit: MemoryAuditComponent,
    pub repo: Arc<MemoryRepository>,
    pub service: RecordsManagementAuditService,
    pub file_plan: NodeRef,
    pub admin: Actor,
}

pub fn title() -> QName {
    QName::new(CONTENT_MODEL_URI, "title")
}

pub fn titled(value: &str) -> PropertyMap {
    PropertyMap::from([(title(), PropertyValue::text(value))])
}

pub fn fixture() -> Fixture {
    fixture_with(AuditTrailConfig::default())
}

/// A repository with `/Company Home/Sites/rm/documentLibrary` as the
/// default file plan and `admin` as administrator.
pub fn fixture_with(config: AuditTrailConfig) -> Fixture {
    let audit = MemoryAuditComponent::new()
        .with_application("RM", "/RM")
        .with_application("DOD5015", "/DOD5015");

    let repo = Arc::new(MemoryRepository::new());
    let home = repo.add_folder(None, "Company Home");
    let sites = repo.add_folder(Some(&home), "Sites");
    let site = repo.add_folder(Some(&sites), "rm");
    let file_plan = repo.add_folder(Some(&site), "documentLibrary");
    repo.register_file_plan("rm", &file_plan);
    repo.register_site("rm", TYPE_RM_SITE);
    repo.define_type(TYPE_FOLDER, "Folder");
    repo.add_administrator("admin");

    let service = RecordsManagementAuditService::builder()
        .audit(Arc::new(audit.clone()))
        .repository(Repository::from_backend(Arc::clone(&repo)))
        .config(config)
        .build()
        .unwrap();

    Fixture {
        audit,
        repo,
        service,
        file_plan,
        admin: Actor::new("admin").with_full_name("Administrator"),
    }
}

impl Fixture {
    /// A folder inside the file plan that is not itself a file plan
    /// component.
    pub fn add_document(&self, name: &str) -> NodeRef {
        self.repo.add_folder(Some(&self.file_plan), name)
    }

    /// Events with the given name, as the administrator sees them.
    pub async fn events_named(&self, event: &str) -> Vec<rmaudit_trail::RecordsManagementAuditEntry> {
        self.service
            .get_audit_trail(
                &self.admin,
                &RecordsManagementAuditQueryParameters::new().with_event(event),
            )
            .await
            .unwrap()
    }

    /// Audit one event as `user` in its own transaction.
    pub async fn record(
        &self,
        user: &str,
        node: &NodeRef,
        event: &str,
        before: PropertyMap,
        after: PropertyMap,
    ) {
        let mut txn = AuditTransaction::new(Actor::new(user));
        self.service
            .audit_event(&mut txn, node, event, before, after, AuditOptions::default())
            .await
            .unwrap();
        self.service.commit(txn).await.unwrap();
    }

    /// Entries recorded by `user`, as `viewer` sees them.
    pub async fn trail_of(&self, viewer: &Actor, user: &str) -> Vec<rmaudit_trail::RecordsManagementAuditEntry> {
        self.service
            .get_audit_trail(
                viewer,
                &RecordsManagementAuditQueryParameters::new().with_user(user),
            )
            .await
            .unwrap()
    }
}
