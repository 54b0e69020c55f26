//! File-system document store.
//!
//! Directory structure:
//! ```text
//! documents_dir/
//! └── {collection_root}/public/data/
//!     └── recipes.json      # every document of the collection + next sequence
//! ```

use super::Collection;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use chrono::Utc;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::recipe::{
    CollectionPath, DocumentStore, OrderBy, StoredDocument, sort_documents,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Document store persisting each collection as one JSON file.
///
/// Writes take an exclusive file lock, so several processes sharing the same
/// directory still get unique, strictly increasing sequence numbers.
pub struct FileDocumentStore {
    root_dir: PathBuf,
}

impl FileDocumentStore {
    /// Creates a store rooted at `root_dir`, creating the directory if needed.
    pub async fn new(root_dir: impl AsRef<Path>) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await.map_err(|e| {
            RecipeBoxError::io(format!(
                "Failed to create documents directory '{}': {}",
                root_dir.display(),
                e
            ))
        })?;
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn collection_file(&self, collection: &CollectionPath) -> AtomicJsonFile<Collection> {
        AtomicJsonFile::new(self.root_dir.join(format!("{}.json", collection.as_str())))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn insert(
        &self,
        collection: &CollectionPath,
        fields: Map<String, Value>,
    ) -> Result<StoredDocument> {
        let file = self.collection_file(collection);
        let document = tokio::task::spawn_blocking(move || {
            file.update(Collection::default(), |c| Ok(c.append(fields, Utc::now())))
        })
        .await
        .map_err(|e| RecipeBoxError::internal(format!("document write task failed: {}", e)))??;

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
        let file = self.collection_file(collection);
        let loaded = tokio::task::spawn_blocking(move || file.load_locked())
            .await
            .map_err(|e| RecipeBoxError::internal(format!("document read task failed: {}", e)))??;

        let mut documents = loaded.map(|c| c.documents).unwrap_or_default();
        sort_documents(&mut documents, order);
        Ok(documents)
    }
}
