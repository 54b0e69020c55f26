//! In-memory document store.

use super::Collection;
use async_trait::async_trait;
use chrono::Utc;
use recipebox_core::error::Result;
use recipebox_core::recipe::{
    CollectionPath, DocumentStore, OrderBy, StoredDocument, sort_documents,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Document store that lives for the duration of the process.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<CollectionPath, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &self,
        collection: &CollectionPath,
        fields: Map<String, Value>,
    ) -> Result<StoredDocument> {
        let mut collections = self.collections.lock().await;
        let document = collections
            .entry(collection.clone())
            .or_default()
            .append(fields, Utc::now());
        tracing::debug!(
            "Inserted document {} into {} (sequence {})",
            document.id,
            collection,
            document.sequence
        );
        Ok(document)
    }

    async fn query_all(
        &self,
        collection: &CollectionPath,
        order: OrderBy,
    ) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.lock().await;
        let mut documents = collections
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default();
        sort_documents(&mut documents, order);
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(name.to_string()));
        map
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::recipes("test").unwrap();

        let documents = store.query_all(&path, OrderBy::CreatedAtDesc).await.unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_insert_then_query_newest_first() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::recipes("test").unwrap();

        for name in ["r1", "r2", "r3"] {
            store.insert(&path, fields(name)).await.unwrap();
        }

        let documents = store.query_all(&path, OrderBy::CreatedAtDesc).await.unwrap();
        let names: Vec<_> = documents
            .iter()
            .map(|d| d.fields["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["r3", "r2", "r1"]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryDocumentStore::new();
        let a = CollectionPath::recipes("a").unwrap();
        let b = CollectionPath::recipes("b").unwrap();

        store.insert(&a, fields("only-a")).await.unwrap();

        assert_eq!(store.query_all(&a, OrderBy::CreatedAtAsc).await.unwrap().len(), 1);
        assert!(store.query_all(&b, OrderBy::CreatedAtAsc).await.unwrap().is_empty());
    }
}
