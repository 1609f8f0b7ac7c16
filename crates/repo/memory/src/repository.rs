use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use rmaudit_core::model::{PROP_CONTENT, PROP_NAME, TYPE_CONTENT, TYPE_FOLDER};
use rmaudit_core::{AccessStatus, Actor, NodeRef, PropertyMap, PropertyValue, QName};
use rmaudit_repo::dictionary::PropertyDefinition;
use rmaudit_repo::error::RepoError;
use rmaudit_repo::services::{
    CapabilityService, DictionaryService, FilePlanService, NodeService, PermissionService,
    SiteService,
};

/// Content written through [`NodeService::create_content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    node_type: QName,
    parent: Option<NodeRef>,
    properties: PropertyMap,
    content: Option<StoredContent>,
}

/// In-memory implementation of every repository collaborator.
///
/// Permissions default to denied: readers, capabilities and administrators
/// must be granted explicitly.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    nodes: DashMap<NodeRef, NodeRecord>,
    property_defs: DashMap<QName, PropertyDefinition>,
    type_titles: DashMap<QName, String>,
    /// `(user, node)` pairs with read access.
    readers: DashSet<(String, NodeRef)>,
    /// `(user, node, capability)` grants.
    capabilities: DashSet<(String, NodeRef, String)>,
    /// Users allowed everything.
    administrators: DashSet<String>,
    file_plan_components: DashSet<NodeRef>,
    /// Site short name -> file plan node.
    file_plans: DashMap<String, NodeRef>,
    /// Site short name -> site type.
    sites: DashMap<String, QName>,
    next_id: AtomicU64,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_node_ref(&self) -> NodeRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        NodeRef::in_spaces_store(format!("node-{id}"))
    }

    /// Create a node with a `cm:name` and return its reference.
    pub fn add_node(&self, node_type: QName, parent: Option<&NodeRef>, name: &str) -> NodeRef {
        let node = self.next_node_ref();
        let mut properties = PropertyMap::new();
        properties.insert(PROP_NAME, PropertyValue::text(name));
        self.nodes.insert(
            node.clone(),
            NodeRecord {
                node_type,
                parent: parent.cloned(),
                properties,
                content: None,
            },
        );
        node
    }

    /// Create a `cm:folder` node.
    pub fn add_folder(&self, parent: Option<&NodeRef>, name: &str) -> NodeRef {
        self.add_node(TYPE_FOLDER, parent, name)
    }

    /// Set a property on an existing node. Unknown nodes are ignored.
    pub fn set_property(&self, node: &NodeRef, property: QName, value: PropertyValue) {
        if let Some(mut record) = self.nodes.get_mut(node) {
            record.properties.insert(property, value);
        }
    }

    /// Delete a node. Its children are left dangling.
    pub fn remove_node(&self, node: &NodeRef) -> bool {
        self.nodes.remove(node).is_some()
    }

    /// The content stored on a node, if any.
    pub fn content(&self, node: &NodeRef) -> Option<StoredContent> {
        self.nodes.get(node).and_then(|r| r.content.clone())
    }

    pub fn define_property(&self, definition: PropertyDefinition) {
        self.property_defs.insert(definition.name.clone(), definition);
    }

    pub fn define_type(&self, type_name: QName, title: &str) {
        self.type_titles.insert(type_name, title.to_owned());
    }

    pub fn grant_read(&self, user: &str, node: &NodeRef) {
        self.readers.insert((user.to_owned(), node.clone()));
    }

    pub fn grant_capability(&self, user: &str, node: &NodeRef, capability: &str) {
        self.capabilities
            .insert((user.to_owned(), node.clone(), capability.to_owned()));
    }

    pub fn add_administrator(&self, user: &str) {
        self.administrators.insert(user.to_owned());
    }

    pub fn mark_file_plan_component(&self, node: &NodeRef) {
        self.file_plan_components.insert(node.clone());
    }

    /// Register `file_plan` as the file plan of `site_id`. The node also
    /// becomes a file plan component.
    pub fn register_file_plan(&self, site_id: &str, file_plan: &NodeRef) {
        self.file_plans.insert(site_id.to_owned(), file_plan.clone());
        self.mark_file_plan_component(file_plan);
    }

    pub fn register_site(&self, short_name: &str, site_type: QName) {
        self.sites.insert(short_name.to_owned(), site_type);
    }

    fn is_administrator(&self, actor: &Actor) -> bool {
        self.administrators.contains(&actor.user_name)
    }
}

#[async_trait]
impl NodeService for MemoryRepository {
    async fn exists(&self, node: &NodeRef) -> Result<bool, RepoError> {
        Ok(self.nodes.contains_key(node))
    }

    async fn node_type(&self, node: &NodeRef) -> Result<Option<QName>, RepoError> {
        Ok(self.nodes.get(node).map(|r| r.node_type.clone()))
    }

    async fn get_property(
        &self,
        node: &NodeRef,
        property: &QName,
    ) -> Result<Option<PropertyValue>, RepoError> {
        Ok(self
            .nodes
            .get(node)
            .and_then(|r| r.properties.get(property).cloned()))
    }

    async fn display_path(&self, node: &NodeRef) -> Result<Option<String>, RepoError> {
        let mut names = Vec::new();
        let mut current = Some(node.clone());
        while let Some(node) = current {
            let Some(record) = self.nodes.get(&node) else {
                // A missing ancestor ends the path; a missing start node has none.
                if names.is_empty() {
                    return Ok(None);
                }
                break;
            };
            let name = record
                .properties
                .get(&PROP_NAME)
                .map_or_else(|| node.id.clone(), ToString::to_string);
            names.push(name);
            current = record.parent.clone();
        }
        names.reverse();
        Ok(Some(format!("/{}", names.join("/"))))
    }

    async fn create_content(
        &self,
        parent: &NodeRef,
        name: &str,
        mimetype: &str,
        content: Vec<u8>,
    ) -> Result<NodeRef, RepoError> {
        if !self.nodes.contains_key(parent) {
            return Err(RepoError::NodeNotFound(parent.to_string()));
        }
        let duplicate = self.nodes.iter().any(|entry| {
            entry.value().parent.as_ref() == Some(parent)
                && entry.value().properties.get(&PROP_NAME).and_then(PropertyValue::as_text)
                    == Some(name)
        });
        if duplicate {
            return Err(RepoError::DuplicateChildName(name.to_owned()));
        }

        let node = self.add_node(TYPE_CONTENT, Some(parent), name);
        if let Some(mut record) = self.nodes.get_mut(&node) {
            record
                .properties
                .insert(PROP_CONTENT, PropertyValue::text(mimetype));
            record.content = Some(StoredContent {
                mimetype: mimetype.to_owned(),
                bytes: content,
            });
        }
        Ok(node)
    }
}

#[async_trait]
impl DictionaryService for MemoryRepository {
    async fn property(&self, name: &QName) -> Result<Option<PropertyDefinition>, RepoError> {
        Ok(self.property_defs.get(name).map(|d| d.value().clone()))
    }

    async fn type_title(&self, type_name: &QName) -> Result<Option<String>, RepoError> {
        Ok(self.type_titles.get(type_name).map(|t| t.value().clone()))
    }
}

#[async_trait]
impl PermissionService for MemoryRepository {
    async fn has_read_permission(
        &self,
        actor: &Actor,
        node: &NodeRef,
    ) -> Result<AccessStatus, RepoError> {
        let allowed = self.is_administrator(actor)
            || self
                .readers
                .contains(&(actor.user_name.clone(), node.clone()));
        Ok(AccessStatus::from(allowed))
    }
}

#[async_trait]
impl CapabilityService for MemoryRepository {
    async fn capability_access_state(
        &self,
        actor: &Actor,
        node: &NodeRef,
        capability: &str,
    ) -> Result<AccessStatus, RepoError> {
        let allowed = self.is_administrator(actor)
            || self.capabilities.contains(&(
                actor.user_name.clone(),
                node.clone(),
                capability.to_owned(),
            ));
        Ok(AccessStatus::from(allowed))
    }
}

#[async_trait]
impl FilePlanService for MemoryRepository {
    async fn is_file_plan_component(&self, node: &NodeRef) -> Result<bool, RepoError> {
        Ok(self.file_plan_components.contains(node))
    }

    async fn file_plan_by_site_id(&self, site_id: &str) -> Result<Option<NodeRef>, RepoError> {
        Ok(self.file_plans.get(site_id).map(|n| n.value().clone()))
    }
}

#[async_trait]
impl SiteService for MemoryRepository {
    async fn site_type(&self, short_name: &str) -> Result<Option<QName>, RepoError> {
        Ok(self.sites.get(short_name).map(|t| t.value().clone()))
    }
}
