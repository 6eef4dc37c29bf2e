use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::document::{now, Document};
use super::store::{DocumentStore, StoreResult, UpdateMode};
use crate::filter::{Filter, FilterOrder, FilterWhere, ListQuery};

/// In-process document store. Each call takes the lock once, so every
/// operation is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<Uuid, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document> {
        let ts = now();
        let document = Document::new(Uuid::new_v4(), fields, ts, ts);

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn find(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(vec![]);
        };

        let mut matching: Vec<&Document> = documents
            .values()
            .filter(|doc| FilterWhere::matches(&query.filter, doc))
            .collect();
        matching.sort_by(|a, b| FilterOrder::compare(&query.sort, a, b));

        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.page.limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|docs| docs.values().filter(|doc| FilterWhere::matches(filter, doc)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(None);
        };

        match mode {
            UpdateMode::Merge => document.fields.extend(fields),
            UpdateMode::Replace => document.fields = fields,
        }
        document.updated_at = now().max(document.updated_at + Duration::microseconds(1));
        Ok(Some(document.clone()))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        Ok(collections.get_mut(collection).and_then(|docs| docs.remove(&id)))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = documents.len();
        documents.retain(|_, doc| !FilterWhere::matches(filter, doc));
        Ok((before - documents.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
