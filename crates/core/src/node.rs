use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifies a node store, e.g. `workspace://SpacesStore`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreRef {
    pub protocol: String,
    pub identifier: String,
}

impl StoreRef {
    /// Create a store reference.
    #[must_use]
    pub fn new(protocol: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            identifier: identifier.into(),
        }
    }

    /// The primary content store, `workspace://SpacesStore`.
    #[must_use]
    pub fn spaces_store() -> Self {
        Self::new("workspace", "SpacesStore")
    }
}

impl fmt::Display for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.identifier)
    }
}

/// Addresses a single repository node: `protocol://identifier/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeRef {
    pub store: StoreRef,
    pub id: String,
}

impl NodeRef {
    /// Create a node reference in the given store.
    #[must_use]
    pub fn new(store: StoreRef, id: impl Into<String>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }

    /// Create a node reference in `workspace://SpacesStore`.
    #[must_use]
    pub fn in_spaces_store(id: impl Into<String>) -> Self {
        Self::new(StoreRef::spaces_store(), id)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store, self.id)
    }
}

impl FromStr for NodeRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidNodeRef(s.to_owned());
        let (protocol, rest) = s.split_once("://").ok_or_else(invalid)?;
        let (identifier, id) = rest.split_once('/').ok_or_else(invalid)?;
        if protocol.is_empty() || identifier.is_empty() || id.is_empty() || id.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(StoreRef::new(protocol, identifier), id))
    }
}

impl TryFrom<String> for NodeRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeRef> for String {
    fn from(node: NodeRef) -> Self {
        node.to_string()
    }
}
