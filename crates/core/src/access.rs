use serde::{Deserialize, Serialize};

/// Outcome of a permission or capability evaluation.
///
/// Only [`AccessStatus::Allowed`] grants access; anything else is treated as
/// a denial by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Allowed,
    Denied,
    Undetermined,
}

impl AccessStatus {
    /// Returns `true` only for an explicit grant.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl From<bool> for AccessStatus {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }
}
