//! Image upload pipeline.

use chrono::Utc;
use recipebox_core::error::Result;
use recipebox_core::media::{BlobStore, MediaAsset, UploadedMedia};
use std::sync::{Arc, Mutex};

/// Stores image payloads and resolves the URL they can be fetched from.
///
/// Uploads are not idempotent: every call stores a new object under a path
/// carrying a fresh, strictly increasing millisecond timestamp.
pub struct MediaUploader {
    store: Arc<dyn BlobStore>,
    collection_root: String,
    last_timestamp_ms: Mutex<i64>,
}

impl MediaUploader {
    pub fn new(store: Arc<dyn BlobStore>, collection_root: impl Into<String>) -> Self {
        Self {
            store,
            collection_root: collection_root.into(),
            last_timestamp_ms: Mutex::new(i64::MIN),
        }
    }

    /// Uploads `bytes` on behalf of `owner_identity_id`.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable`: The blob store could not be reached
    /// - `UploadRejected`: The blob store refused the payload
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        owner_identity_id: &str,
        original_file_name: &str,
    ) -> Result<UploadedMedia> {
        let content_type = mime_guess::from_path(original_file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let asset = MediaAsset::new(
            &self.collection_root,
            owner_identity_id,
            original_file_name,
            self.next_timestamp_ms(),
            content_type,
            bytes,
        );
        let size = asset.bytes.len() as u64;

        let handle = self
            .store
            .put_object(&asset.path, asset.bytes, &asset.content_type)
            .await?;
        let url = self.store.public_url(&handle).await?;

        tracing::debug!(path = %handle.path, size, "Uploaded image");
        Ok(UploadedMedia {
            path: handle.path,
            url,
            content_type: asset.content_type,
            size,
        })
    }

    fn next_timestamp_ms(&self) -> i64 {
        let mut last = match self.last_timestamp_ms.lock() {
            Ok(last) => last,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now().timestamp_millis();
        *last = if now > *last { now } else { *last + 1 };
        *last
    }
}
