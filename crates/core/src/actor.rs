use serde::{Deserialize, Serialize};

/// The user on whose behalf an audit event is recorded or a trail is viewed.
///
/// Threaded explicitly through the audit service instead of being read from
/// an ambient security context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Login name.
    pub user_name: String,
    /// Display name, if known.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Concatenated records-management role names, if any.
    #[serde(default)]
    pub roles: Option<String>,
}

impl Actor {
    /// Create an actor with only a login name.
    #[must_use]
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            full_name: None,
            roles: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Set the role list.
    #[must_use]
    pub fn with_roles(mut self, roles: impl Into<String>) -> Self {
        self.roles = Some(roles.into());
        self
    }
}
