pub mod error;
pub mod record;
pub mod store;

pub use error::AuditError;
pub use record::{AuditQueryParameters, AuditValue, AuditValues, StoredAuditEntry, build_path};
pub use store::{AuditComponent, AuditQueryCallback, AuditWriteTxn};
