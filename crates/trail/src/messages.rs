//! Localized message lookup.

use std::collections::BTreeMap;

pub const MSG_AUDIT_REPORT: &str = "rm.audit.audit-report";
pub const MSG_AUDIT_START: &str = "rm.audit.audit-start";
pub const MSG_AUDIT_STOP: &str = "rm.audit.audit-stop";
pub const MSG_AUDIT_CLEAR: &str = "rm.audit.audit-clear";
pub const MSG_AUDIT_VIEW: &str = "rm.audit.audit-view";
pub const MSG_HOLD_PERMISSION_DENIED: &str = "rm.audit.holdPermission-Error";

const DEFAULTS: &[(&str, &str)] = &[
    (MSG_AUDIT_REPORT, "Records Management Audit Report"),
    (MSG_AUDIT_START, "Audit Start"),
    (MSG_AUDIT_STOP, "Audit Stop"),
    (MSG_AUDIT_CLEAR, "Audit Clear"),
    (MSG_AUDIT_VIEW, "Audit View"),
    (
        MSG_HOLD_PERMISSION_DENIED,
        "You don't have permission to view this hold.",
    ),
    (
        crate::error::MSG_TRAIL_FILE_FAIL,
        "Failed to generate audit trail file.",
    ),
];

/// Message bundle: configured overrides first, then built-in English text.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    overrides: BTreeMap<String, String>,
}

impl Messages {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Resolve `key`. Unknown keys resolve to themselves.
    pub fn get(&self, key: &str) -> String {
        if let Some(text) = self.overrides.get(key) {
            return text.clone();
        }
        DEFAULTS
            .iter()
            .find(|(k, _)| *k == key)
            .map_or_else(|| key.to_owned(), |(_, text)| (*text).to_owned())
    }
}
