use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model;

/// A namespace-qualified name, rendered as `{uri}local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QName {
    namespace: Cow<'static, str>,
    local_name: Cow<'static, str>,
}

impl QName {
    /// Create a qualified name from owned or borrowed parts.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Cow::Owned(namespace.into()),
            local_name: Cow::Owned(local_name.into()),
        }
    }

    /// Create a qualified name usable in `const` items.
    #[must_use]
    pub const fn from_static(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            local_name: Cow::Borrowed(local_name),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

impl FromStr for QName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('{')
            .ok_or_else(|| CoreError::InvalidQName(s.to_owned()))?;
        let (namespace, local) = rest
            .split_once('}')
            .ok_or_else(|| CoreError::InvalidQName(s.to_owned()))?;
        if local.is_empty() {
            return Err(CoreError::InvalidQName(s.to_owned()));
        }
        Ok(Self::new(namespace, local))
    }
}

impl TryFrom<String> for QName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QName> for String {
    fn from(qname: QName) -> Self {
        qname.to_string()
    }
}

/// Maps short prefixes (`cm`, `rma`, ...) to namespace URIs.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    prefixes: BTreeMap<String, String>,
}

impl NamespaceRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// Register (or replace) a prefix mapping.
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), uri.into());
    }

    /// Look up the URI for a prefix.
    #[must_use]
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Resolve `prefix:local` or the full `{uri}local` form.
    pub fn resolve(&self, name: &str) -> Result<QName, CoreError> {
        if name.starts_with('{') {
            return name.parse();
        }
        let (prefix, local) = name
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidQName(name.to_owned()))?;
        if local.is_empty() {
            return Err(CoreError::InvalidQName(name.to_owned()));
        }
        let uri = self
            .uri(prefix)
            .ok_or_else(|| CoreError::UnknownPrefix(prefix.to_owned()))?;
        Ok(QName::new(uri, local))
    }

    /// Render a name as `prefix:local` when its namespace is registered.
    #[must_use]
    pub fn prefixed(&self, qname: &QName) -> String {
        self.prefixes
            .iter()
            .find(|(_, uri)| uri.as_str() == qname.namespace())
            .map_or_else(
                || qname.to_string(),
                |(prefix, _)| format!("{prefix}:{}", qname.local_name()),
            )
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("sys", model::SYSTEM_MODEL_URI);
        registry.register("cm", model::CONTENT_MODEL_URI);
        registry.register("rma", model::RM_MODEL_URI);
        registry.register("rmc", model::RM_CUSTOM_URI);
        registry.register("dod", model::DOD5015_MODEL_URI);
        registry
    }
}
