use async_trait::async_trait;

use rmaudit_core::{AccessStatus, Actor, NodeRef, PropertyValue, QName};

use crate::dictionary::PropertyDefinition;
use crate::error::RepoError;

/// Node graph access.
#[async_trait]
pub trait NodeService: Send + Sync {
    /// Whether the node currently exists.
    async fn exists(&self, node: &NodeRef) -> Result<bool, RepoError>;

    /// The node's type, or `None` if the node does not exist.
    async fn node_type(&self, node: &NodeRef) -> Result<Option<QName>, RepoError>;

    /// A single property value, or `None` if unset or the node is missing.
    async fn get_property(
        &self,
        node: &NodeRef,
        property: &QName,
    ) -> Result<Option<PropertyValue>, RepoError>;

    /// The `/`-separated chain of names from the root to the node.
    async fn display_path(&self, node: &NodeRef) -> Result<Option<String>, RepoError>;

    /// Create a content node named `name` under `parent`.
    async fn create_content(
        &self,
        parent: &NodeRef,
        name: &str,
        mimetype: &str,
        content: Vec<u8>,
    ) -> Result<NodeRef, RepoError>;
}

/// Content-model metadata lookups.
#[async_trait]
pub trait DictionaryService: Send + Sync {
    async fn property(&self, name: &QName) -> Result<Option<PropertyDefinition>, RepoError>;

    /// Display title of a type, if the type is known and titled.
    async fn type_title(&self, type_name: &QName) -> Result<Option<String>, RepoError>;
}

/// Node-level permission evaluation.
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn has_read_permission(
        &self,
        actor: &Actor,
        node: &NodeRef,
    ) -> Result<AccessStatus, RepoError>;
}

/// Records-management capability evaluation.
#[async_trait]
pub trait CapabilityService: Send + Sync {
    async fn capability_access_state(
        &self,
        actor: &Actor,
        node: &NodeRef,
        capability: &str,
    ) -> Result<AccessStatus, RepoError>;
}

/// File plan lookups.
#[async_trait]
pub trait FilePlanService: Send + Sync {
    /// Whether the node lives inside a records-management file plan.
    async fn is_file_plan_component(&self, node: &NodeRef) -> Result<bool, RepoError>;

    /// The file plan of the given site, if any.
    async fn file_plan_by_site_id(&self, site_id: &str) -> Result<Option<NodeRef>, RepoError>;
}

/// Site lookups.
#[async_trait]
pub trait SiteService: Send + Sync {
    /// Type of the site's node, or `None` if the site does not exist.
    async fn site_type(&self, short_name: &str) -> Result<Option<QName>, RepoError>;
}
