use serde::{Deserialize, Serialize};

use rmaudit_core::QName;
use rmaudit_core::model::datatype;

/// The slice of a property definition the audit trail needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: QName,
    /// Human-readable title, if the model declares one.
    pub title: Option<String>,
    /// Data type name, e.g. `d:mltext`.
    pub data_type: QName,
}

impl PropertyDefinition {
    /// A `d:text` property without a title.
    #[must_use]
    pub fn text(name: QName) -> Self {
        Self {
            name,
            title: None,
            data_type: datatype::TEXT,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: QName) -> Self {
        self.data_type = data_type;
        self
    }

    #[must_use]
    pub fn is_mltext(&self) -> bool {
        self.data_type == datatype::MLTEXT
    }
}
