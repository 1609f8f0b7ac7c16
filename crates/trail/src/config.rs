use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Deserialize;

use rmaudit_core::{NamespaceRegistry, QName};

use crate::error::TrailError;

/// Configuration for the records-management audit trail.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditTrailConfig {
    /// Properties never written to the audit log, as prefixed names
    /// (`cm:modified`) or `{uri}local` names.
    #[serde(default)]
    pub ignored_audit_properties: Vec<String>,
    /// Short name of the default records-management site.
    #[serde(default = "default_site_id")]
    pub default_site_id: String,
    /// Directory for audit trail files. Defaults to the system temp dir.
    #[serde(default)]
    pub trail_file_dir: Option<PathBuf>,
    /// Extra namespace prefixes on top of the built-in ones.
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
    /// Overrides for localized messages, keyed by message key.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
}

impl Default for AuditTrailConfig {
    fn default() -> Self {
        Self {
            ignored_audit_properties: Vec::new(),
            default_site_id: default_site_id(),
            trail_file_dir: None,
            namespaces: BTreeMap::new(),
            messages: BTreeMap::new(),
        }
    }
}

fn default_site_id() -> String {
    "rm".to_owned()
}

impl AuditTrailConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, TrailError> {
        toml::from_str(source).map_err(|e| TrailError::Configuration(e.to_string()))
    }

    /// Built-in prefixes plus the configured ones.
    pub fn namespace_registry(&self) -> NamespaceRegistry {
        let mut registry = NamespaceRegistry::default();
        for (prefix, uri) in &self.namespaces {
            registry.register(prefix.clone(), uri.clone());
        }
        registry
    }

    /// Resolve the ignore-list against `registry`.
    pub fn ignored_properties(
        &self,
        registry: &NamespaceRegistry,
    ) -> Result<BTreeSet<QName>, TrailError> {
        self.ignored_audit_properties
            .iter()
            .map(|name| registry.resolve(name).map_err(TrailError::from))
            .collect()
    }

    /// Directory trail files are created in.
    pub fn trail_file_dir(&self) -> PathBuf {
        self.trail_file_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use rmaudit_core::model::{CONTENT_MODEL_URI, PROP_NAME};

    use super::*;

    #[test]
    fn defaults() {
        let config = AuditTrailConfig::from_toml_str("").unwrap();
        assert!(config.ignored_audit_properties.is_empty());
        assert_eq!(config.default_site_id, "rm");
        assert!(config.trail_file_dir.is_none());
        assert_eq!(config.trail_file_dir(), std::env::temp_dir());
        assert!(config.messages.is_empty());
    }

    #[test]
    fn custom_config() {
        let toml = r#"
            ignored_audit_properties = ["cm:name", "acme:lastSync"]
            default_site_id = "records"
            trail_file_dir = "/var/tmp/audit"

            [namespaces]
            acme = "http://acme.example/model/1.0"

            [messages]
            "rm.audit.audit-report" = "Audit"
        "#;

        let config = AuditTrailConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.default_site_id, "records");
        assert_eq!(config.trail_file_dir(), PathBuf::from("/var/tmp/audit"));
        assert_eq!(config.messages.get("rm.audit.audit-report").unwrap(), "Audit");

        let registry = config.namespace_registry();
        let ignored = config.ignored_properties(&registry).unwrap();
        assert!(ignored.contains(&PROP_NAME));
        assert!(ignored.contains(&QName::new("http://acme.example/model/1.0", "lastSync")));
        assert!(!ignored.contains(&QName::new(CONTENT_MODEL_URI, "title")));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let config = AuditTrailConfig::from_toml_str(
            r#"ignored_audit_properties = ["nope:thing"]"#,
        )
        .unwrap();
        let err = config
            .ignored_properties(&config.namespace_registry())
            .unwrap_err();
        assert!(matches!(err, TrailError::Core(_)));
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = AuditTrailConfig::from_toml_str("default_site_id = [").unwrap_err();
        assert!(matches!(err, TrailError::Configuration(_)));
    }
}
