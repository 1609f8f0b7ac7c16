use thiserror::Error;

/// Errors raised while parsing or resolving repository value types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid node reference: {0}")]
    InvalidNodeRef(String),

    #[error("invalid qualified name: {0}")]
    InvalidQName(String),

    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),
}
