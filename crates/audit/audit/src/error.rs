/// Errors that can occur during audit component operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// An error from the underlying storage backend.
    #[error("storage error: {0}")]
    Storage(String),

    /// The named audit application has not been registered.
    #[error("unknown audit application: {0}")]
    UnknownApplication(String),
}

