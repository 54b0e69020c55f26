//! Blob store interface.

use super::model::ObjectHandle;
use crate::error::Result;
use async_trait::async_trait;

/// Binary object storage with publicly fetchable URLs.
///
/// Implementations enforce their own size/type policy and report a refused
/// payload as `UploadRejected`; any failure to reach the storage is
/// `StorageUnavailable`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path`, replacing nothing: paths are expected to be
    /// unique per upload.
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectHandle>;

    /// Resolves the URL an object can be fetched from.
    async fn public_url(&self, handle: &ObjectHandle) -> Result<String>;
}
