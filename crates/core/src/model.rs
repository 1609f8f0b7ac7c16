//! Namespace URIs and the model names the audit trail reads or writes.

use crate::qname::QName;

pub const SYSTEM_MODEL_URI: &str = "http://www.alfresco.org/model/system/1.0";
pub const CONTENT_MODEL_URI: &str = "http://www.alfresco.org/model/content/1.0";
pub const RM_MODEL_URI: &str = "http://www.alfresco.org/model/recordsmanagement/1.0";
pub const RM_CUSTOM_URI: &str = "http://www.alfresco.org/model/rmcustom/1.0";
pub const DOD5015_MODEL_URI: &str = "http://www.alfresco.org/model/dod5015/1.0";

pub const PROP_NAME: QName = QName::from_static(CONTENT_MODEL_URI, "name");
pub const PROP_CONTENT: QName = QName::from_static(CONTENT_MODEL_URI, "content");
pub const PROP_USERNAME: QName = QName::from_static(CONTENT_MODEL_URI, "userName");
pub const PROP_AUTHORITY_NAME: QName = QName::from_static(CONTENT_MODEL_URI, "authorityName");
pub const PROP_AUTHORITY_DISPLAY_NAME: QName =
    QName::from_static(CONTENT_MODEL_URI, "authorityDisplayName");
pub const TYPE_CONTENT: QName = QName::from_static(CONTENT_MODEL_URI, "content");
pub const TYPE_FOLDER: QName = QName::from_static(CONTENT_MODEL_URI, "folder");

pub const PROP_IDENTIFIER: QName = QName::from_static(RM_MODEL_URI, "identifier");
pub const PROP_PARENT_GROUP: QName = QName::from_static(RM_MODEL_URI, "parentGroup");

/// Pseudo-properties written by hold events; the local names contain spaces.
pub const PROP_HOLD_NAME: QName = QName::from_static(RM_MODEL_URI, "Hold Name");
pub const PROP_HOLD_NODEREF: QName = QName::from_static(RM_MODEL_URI, "Hold NodeRef");

pub const TYPE_RM_SITE: QName = QName::from_static(RM_MODEL_URI, "rmsite");
pub const TYPE_DOD_5015_SITE: QName = QName::from_static(DOD5015_MODEL_URI, "site");

/// Property data types understood by the renderers.
pub mod datatype {
    use super::QName;

    pub const DICTIONARY_URI: &str = "http://www.alfresco.org/model/dictionary/1.0";

    pub const TEXT: QName = QName::from_static(DICTIONARY_URI, "text");
    pub const MLTEXT: QName = QName::from_static(DICTIONARY_URI, "mltext");
    pub const INT: QName = QName::from_static(DICTIONARY_URI, "int");
    pub const LONG: QName = QName::from_static(DICTIONARY_URI, "long");
    pub const DOUBLE: QName = QName::from_static(DICTIONARY_URI, "double");
    pub const BOOLEAN: QName = QName::from_static(DICTIONARY_URI, "boolean");
    pub const DATETIME: QName = QName::from_static(DICTIONARY_URI, "datetime");
    pub const NODE_REF: QName = QName::from_static(DICTIONARY_URI, "noderef");
    pub const QNAME: QName = QName::from_static(DICTIONARY_URI, "qname");
}
