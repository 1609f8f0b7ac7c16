use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::node::NodeRef;
use crate::qname::QName;

/// Property values keyed by qualified name, in a deterministic order.
pub type PropertyMap = BTreeMap<QName, PropertyValue>;

/// Locale whose text is shown when a multilingual value is rendered.
pub const DEFAULT_LOCALE: &str = "en";

/// Multilingual text: locale tag to localized string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MlText(BTreeMap<String, String>);

impl MlText {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the text for a locale.
    #[must_use]
    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    #[must_use]
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// The value for [`DEFAULT_LOCALE`], falling back to a regional variant
    /// of it, then the locale-neutral entry, then the first entry.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.get(DEFAULT_LOCALE)
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(locale, _)| {
                        locale
                            .split(['_', '-'])
                            .next()
                            .is_some_and(|language| language == DEFAULT_LOCALE)
                    })
                    .map(|(_, text)| text.as_str())
            })
            .or_else(|| self.get(""))
            .or_else(|| self.0.values().next().map(String::as_str))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single node property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Null,
    Text(String),
    MlText(MlText),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    NodeRef(NodeRef),
    QName(QName),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Convenience constructor for text values.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string of a [`PropertyValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_node_ref(&self) -> Option<&NodeRef> {
        match self {
            Self::NodeRef(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            Self::QName(qname) => Some(qname),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::MlText(ml) => f.write_str(ml.default_value().unwrap_or_default()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::NodeRef(node) => write!(f, "{node}"),
            Self::QName(qname) => write!(f, "{qname}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NodeRef> for PropertyValue {
    fn from(value: NodeRef) -> Self {
        Self::NodeRef(value)
    }
}

impl From<QName> for PropertyValue {
    fn from(value: QName) -> Self {
        Self::QName(value)
    }
}

impl From<MlText> for PropertyValue {
    fn from(value: MlText) -> Self {
        Self::MlText(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}
