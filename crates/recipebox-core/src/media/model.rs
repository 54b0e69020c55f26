//! Media domain models.

use serde::{Deserialize, Serialize};

/// Fallback name for uploads whose original name is empty.
const DEFAULT_FILE_NAME: &str = "image";

/// An image payload on its way to the blob store.
///
/// Exists only for the duration of one upload; nothing about it is persisted
/// except the object it produces.
#[derive(Clone)]
pub struct MediaAsset {
    /// `{collection_root}/recipe_images/{owner}/{file_name}_{timestamp}`
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaAsset {
    pub fn new(
        collection_root: &str,
        owner_identity_id: &str,
        original_file_name: &str,
        upload_timestamp_ms: i64,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            path: object_path(
                collection_root,
                owner_identity_id,
                original_file_name,
                upload_timestamp_ms,
            ),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAsset")
            .field("path", &self.path)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Builds the storage path of an uploaded image.
pub fn object_path(
    collection_root: &str,
    owner_identity_id: &str,
    original_file_name: &str,
    upload_timestamp_ms: i64,
) -> String {
    format!(
        "{}/recipe_images/{}/{}_{}",
        collection_root,
        owner_identity_id,
        sanitize_file_name(original_file_name),
        upload_timestamp_ms
    )
}

/// Reduces a client-supplied file name to its last path component.
///
/// Keeps an upload inside its owner's directory whatever the client sent.
pub fn sanitize_file_name(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match last {
        "" | "." | ".." => DEFAULT_FILE_NAME.to_string(),
        name => name.to_string(),
    }
}

/// Blob store reference to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHandle {
    pub path: String,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub path: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_layout() {
        let path = object_path("kitchen", "u-1", "cake.png", 1_700_000_000_123);
        assert_eq!(path, "kitchen/recipe_images/u-1/cake.png_1700000000123");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\pie.jpg"), "pie.jpg");
        assert_eq!(sanitize_file_name("dir/"), "image");
        assert_eq!(sanitize_file_name(".."), "image");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[test]
    fn test_media_asset_builds_path() {
        let asset = MediaAsset::new("k", "owner", "a.jpg", 5, "image/jpeg", vec![1, 2, 3]);
        assert_eq!(asset.path, "k/recipe_images/owner/a.jpg_5");
        assert_eq!(asset.bytes.len(), 3);
    }
}
