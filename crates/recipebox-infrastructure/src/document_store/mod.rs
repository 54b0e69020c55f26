//! Reference `DocumentStore` backends.

mod file;
mod memory;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use chrono::{DateTime, Utc};
use recipebox_core::recipe::{StoredDocument, next_created_at};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Contents of one collection, shared by both backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    next_sequence: u64,
    documents: Vec<StoredDocument>,
}

impl Collection {
    /// Appends a record with a fresh server envelope.
    fn append(&mut self, fields: Map<String, Value>, now: DateTime<Utc>) -> StoredDocument {
        let previous = self.documents.last().map(|doc| doc.created_at);
        let document = StoredDocument {
            id: Uuid::new_v4().to_string(),
            created_at: next_created_at(now, previous),
            sequence: self.next_sequence,
            fields,
        };
        self.next_sequence += 1;
        self.documents.push(document.clone());
        document
    }
}
