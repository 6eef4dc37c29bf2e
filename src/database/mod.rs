pub mod document;
pub mod manager;
pub mod memory;
pub mod query_builder;
pub mod repository;
pub mod store;

pub use document::{Document, DocumentBody, DocumentError};
pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use repository::Repository;
pub use store::{DocumentStore, StoreError, StoreResult, UpdateMode};
