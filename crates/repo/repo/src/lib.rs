pub mod dictionary;
pub mod error;
pub mod services;

use std::sync::Arc;

pub use dictionary::PropertyDefinition;
pub use error::RepoError;
pub use services::{
    CapabilityService, DictionaryService, FilePlanService, NodeService, PermissionService,
    SiteService,
};

/// Handles to every repository collaborator the audit trail consumes.
#[derive(Clone)]
pub struct Repository {
    pub nodes: Arc<dyn NodeService>,
    pub dictionary: Arc<dyn DictionaryService>,
    pub permissions: Arc<dyn PermissionService>,
    pub capabilities: Arc<dyn CapabilityService>,
    pub file_plans: Arc<dyn FilePlanService>,
    pub sites: Arc<dyn SiteService>,
}

impl Repository {
    /// Use one backend for every collaborator.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: NodeService
            + DictionaryService
            + PermissionService
            + CapabilityService
            + FilePlanService
            + SiteService
            + 'static,
    {
        Self {
            nodes: backend.clone(),
            dictionary: backend.clone(),
            permissions: backend.clone(),
            capabilities: backend.clone(),
            file_plans: backend.clone(),
            sites: backend,
        }
    }
}
