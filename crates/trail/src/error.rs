use thiserror::Error;

/// Message key attached to every report-generation failure.
pub const MSG_TRAIL_FILE_FAIL: &str = "rm.audit.trail-file-fail";

/// Errors raised by the records-management audit trail.
#[derive(Debug, Error)]
pub enum TrailError {
    /// The generic audit component failed.
    #[error("audit error: {0}")]
    Audit(#[from] rmaudit_audit::AuditError),

    /// A repository collaborator failed.
    #[error("repository error: {0}")]
    Repo(#[from] rmaudit_repo::RepoError),

    /// A name or node reference could not be parsed.
    #[error("core error: {0}")]
    Core(#[from] rmaudit_core::CoreError),

    /// The service was misconfigured (e.g. missing collaborators).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Writing an audit trail report failed.
    #[error("{key}: {message}")]
    ReportGeneration {
        /// Localizable message key, always [`MSG_TRAIL_FILE_FAIL`].
        key: &'static str,
        message: String,
    },

    /// No file plan exists for the default records-management site.
    #[error("default file plan not found for site '{0}'")]
    DefaultFilePlanMissing(String),
}

impl TrailError {
    pub(crate) fn report(err: impl std::fmt::Display) -> Self {
        Self::ReportGeneration {
            key: MSG_TRAIL_FILE_FAIL,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for TrailError {
    fn from(err: std::io::Error) -> Self {
        Self::report(err)
    }
}

impl From<minijinja::Error> for TrailError {
    fn from(err: minijinja::Error) -> Self {
        Self::report(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_carry_the_trail_file_key() {
        let err = TrailError::from(std::io::Error::other("disk full"));
        match &err {
            TrailError::ReportGeneration { key, message } => {
                assert_eq!(*key, MSG_TRAIL_FILE_FAIL);
                assert_eq!(message, "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "rm.audit.trail-file-fail: disk full");
    }
}
