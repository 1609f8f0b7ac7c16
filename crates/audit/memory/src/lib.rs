mod store;

pub use store::MemoryAuditComponent;
