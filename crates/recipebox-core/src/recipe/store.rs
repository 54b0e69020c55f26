//! Document store interface.

use crate::error::{RecipeBoxError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Address of a collection in the document store.
///
/// Recipes always live under the partitioned path
/// `{collection_root}/public/data/recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Builds the recipe collection path for a deployment.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if `collection_root` is empty, contains `/`,
    /// or starts with `.`.
    pub fn recipes(collection_root: &str) -> Result<Self> {
        validate_collection_root(collection_root)?;
        Ok(Self(format!("{}/public/data/recipes", collection_root)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that a collection root is usable as a single path segment.
pub fn validate_collection_root(collection_root: &str) -> Result<()> {
    if collection_root.trim().is_empty() {
        return Err(RecipeBoxError::config("collection_root must not be empty"));
    }
    if collection_root.contains('/') || collection_root.contains('\\') {
        return Err(RecipeBoxError::config(format!(
            "collection_root '{}' must be a single path segment",
            collection_root
        )));
    }
    if collection_root.starts_with('.') {
        return Err(RecipeBoxError::config(format!(
            "collection_root '{}' must not start with '.'",
            collection_root
        )));
    }
    Ok(())
}

/// A record as the store holds it: client fields plus the server envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Server-assigned id.
    pub id: String,
    /// Server-assigned write time; never earlier than the previous write.
    pub created_at: DateTime<Utc>,
    /// Insertion counter, strictly increasing per collection.
    pub sequence: u64,
    pub fields: Map<String, Value>,
}

/// Ordering for [`DocumentStore::query_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAtAsc,
    CreatedAtDesc,
}

/// Sorts documents by `created_at`, breaking ties with the insertion sequence
/// in the same direction (for descending order, the later insert comes first).
pub fn sort_documents(documents: &mut [StoredDocument], order: OrderBy) {
    documents.sort_by(|a, b| {
        let ascending = a
            .created_at
            .cmp(&b.created_at)
            .then(a.sequence.cmp(&b.sequence));
        match order {
            OrderBy::CreatedAtAsc => ascending,
            OrderBy::CreatedAtDesc => ascending.reverse(),
        }
    });
}

/// Returns the timestamp to stamp on the next write so that `created_at`
/// never moves backwards within a collection.
pub fn next_created_at(now: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}

/// A document store holding append-only collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Appends a record, assigning `id`, `created_at` and `sequence`.
    ///
    /// # Returns
    ///
    /// - `Ok(StoredDocument)`: The record with its server envelope
    /// - `Err(_)`: The write failed; nothing was stored
    async fn insert(
        &self,
        collection: &CollectionPath,
        fields: Map<String, Value>,
    ) -> Result<StoredDocument>;

    /// Returns every record of a collection in the requested order.
    ///
    /// A collection that was never written to is empty, not an error.
    async fn query_all(
        &self,
        collection: &CollectionPath,
        order: OrderBy,
    ) -> Result<Vec<StoredDocument>>;
}
