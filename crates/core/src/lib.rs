pub mod access;
pub mod actor;
pub mod error;
pub mod model;
pub mod node;
pub mod qname;
pub mod value;

pub use access::AccessStatus;
pub use actor::Actor;
pub use error::CoreError;
pub use node::{NodeRef, StoreRef};
pub use qname::{NamespaceRegistry, QName};
pub use value::{MlText, PropertyMap, PropertyValue};
