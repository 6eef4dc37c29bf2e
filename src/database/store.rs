use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::document::Document;
use crate::filter::{Filter, ListQuery};

/// Errors from a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How an update applies the request body to the stored fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Top-level keys in the body overwrite stored keys; others are kept
    Merge,
    /// The body becomes the complete set of caller fields
    Replace,
}

/// Abstract document storage, addressed by collection name.
///
/// Every method is a single atomic store operation. Identifiers and
/// timestamps are always assigned by the store: `created_at` once on insert,
/// `updated_at` on insert and on every update, strictly increasing per document.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Inserts a new document and returns it as stored.
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document>;

    /// Returns one page of matching documents in sort order.
    async fn find(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>>;

    /// Counts documents matching the filter.
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Fetches a document by id.
    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>>;

    /// Applies the fields to an existing document. `None` when absent.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> StoreResult<Option<Document>>;

    /// Removes a document, returning it. `None` when absent.
    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>>;

    /// Removes every document matching the filter, returning the count.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Liveness check against the backing store.
    async fn ping(&self) -> StoreResult<()>;
}
