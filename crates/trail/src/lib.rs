//! Records-management audit trail.
//!
//! Captures before/after property snapshots for repository events inside an
//! [`AuditTransaction`], persists the property delta through a generic
//! [`AuditComponent`](rmaudit_audit::AuditComponent), and reconstructs,
//! filters and renders the trail as entries or HTML/JSON reports.

pub mod builder;
pub mod config;
pub mod diff;
pub mod entry;
pub mod error;
pub mod events;
pub mod messages;
pub mod query;
pub mod render;
pub mod schema;
pub mod service;
pub mod txn;
pub mod visibility;

pub use builder::RecordsManagementAuditServiceBuilder;
pub use config::AuditTrailConfig;
pub use diff::PropertyChange;
pub use entry::RecordsManagementAuditEntry;
pub use error::TrailError;
pub use events::AuditEvent;
pub use query::RecordsManagementAuditQueryParameters;
pub use render::{ReportFormat, ReportWriter};
pub use schema::{AuditSchema, DecodedEntry};
pub use service::RecordsManagementAuditService;
pub use txn::{AuditOptions, AuditTransaction, FlushReport, PendingAuditRecord};
