//! In-memory blob store.

use super::{UploadPolicy, validate_object_path};
use async_trait::async_trait;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::media::{BlobStore, ObjectHandle};
use std::collections::HashMap;
use tokio::sync::Mutex;

const URL_SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Blob store that keeps objects in process memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    policy: UploadPolicy,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the bytes and content type stored at `path`.
    pub async fn get(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .await
            .get(path)
            .map(|o| (o.bytes.clone(), o.content_type.clone()))
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectHandle> {
        validate_object_path(path)?;
        self.policy.check(bytes.len() as u64, content_type)?;

        let mut objects = self.objects.lock().await;
        if objects.contains_key(path) {
            return Err(RecipeBoxError::rejected(format!(
                "object '{}' already exists",
                path
            )));
        }
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(ObjectHandle {
            path: path.to_string(),
        })
    }

    async fn public_url(&self, handle: &ObjectHandle) -> Result<String> {
        if !self.objects.lock().await.contains_key(&handle.path) {
            return Err(RecipeBoxError::storage_unavailable(format!(
                "object '{}' not found",
                handle.path
            )));
        }
        Ok(format!("{}{}", URL_SCHEME, handle.path))
    }
}
