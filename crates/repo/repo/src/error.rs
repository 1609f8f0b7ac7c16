use thiserror::Error;

/// Errors from repository collaborator operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate child name: {0}")]
    DuplicateChildName(String),

    #[error("backend error: {0}")]
    Backend(String),
}
