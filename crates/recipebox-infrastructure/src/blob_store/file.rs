//! File system-based blob store.
//!
//! Objects are stored as plain files under a root directory, at their object
//! path. URLs point either at a configured public base URL (when the root is
//! served by a web server) or at the file itself.

use super::{UploadPolicy, validate_object_path};
use async_trait::async_trait;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::media::{BlobStore, ObjectHandle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub struct FileSystemBlobStore {
    /// Absolute root directory for all objects
    root_dir: PathBuf,
    public_base_url: Option<String>,
    policy: UploadPolicy,
}

impl FileSystemBlobStore {
    /// Creates a new `FileSystemBlobStore`, ensuring the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the directory cannot be created or resolved.
    pub async fn new(
        root_dir: impl AsRef<Path>,
        public_base_url: Option<String>,
        policy: UploadPolicy,
    ) -> Result<Self> {
        let root_dir = root_dir.as_ref();
        fs::create_dir_all(root_dir).await.map_err(|e| {
            RecipeBoxError::storage_unavailable(format!(
                "Failed to create blob directory '{}': {}",
                root_dir.display(),
                e
            ))
        })?;
        let root_dir = fs::canonicalize(root_dir).await.map_err(|e| {
            RecipeBoxError::storage_unavailable(format!(
                "Failed to resolve blob directory '{}': {}",
                root_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            root_dir,
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
            policy,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn object_file(&self, path: &str) -> PathBuf {
        self.root_dir.join(path)
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectHandle> {
        validate_object_path(path)?;
        self.policy.check(bytes.len() as u64, content_type)?;

        let dest_path = self.object_file(path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                RecipeBoxError::storage_unavailable(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    RecipeBoxError::rejected(format!("object '{}' already exists", path))
                }
                _ => RecipeBoxError::storage_unavailable(format!(
                    "Failed to create '{}': {}",
                    dest_path.display(),
                    e
                )),
            })?;

        let written = async {
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            // A partial object must not be resolvable later.
            let _ = fs::remove_file(&dest_path).await;
            return Err(RecipeBoxError::storage_unavailable(format!(
                "Failed to write '{}': {}",
                dest_path.display(),
                e
            )));
        }

        tracing::debug!(
            "Stored object {} ({} bytes, {})",
            path,
            bytes.len(),
            content_type
        );
        Ok(ObjectHandle {
            path: path.to_string(),
        })
    }

    async fn public_url(&self, handle: &ObjectHandle) -> Result<String> {
        validate_object_path(&handle.path)?;
        let file_path = self.object_file(&handle.path);
        if fs::metadata(&file_path).await.is_err() {
            return Err(RecipeBoxError::storage_unavailable(format!(
                "object '{}' not found",
                handle.path
            )));
        }

        let url = match &self.public_base_url {
            Some(base) => format!("{}/{}", base, encode_path(&handle.path)),
            None => format!("file://{}", encode_path(&file_path.to_string_lossy())),
        };
        Ok(url)
    }
}

/// Percent-encodes each `/`-separated segment of `path`.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_creates_root_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("blobs");
        assert!(!root.exists());

        let _store = FileSystemBlobStore::new(&root, None, UploadPolicy::default())
            .await
            .unwrap();

        assert!(root.exists());
    }

    #[tokio::test]
    async fn test_put_object_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(temp_dir.path(), None, UploadPolicy::default())
            .await
            .unwrap();

        let handle = store
            .put_object("k/recipe_images/u-1/pie.jpg_42", b"jpeg".to_vec(), "image/jpeg")
            .await
            .unwrap();

        let stored = fs::read(store.root_dir().join(&handle.path)).await.unwrap();
        assert_eq!(stored, b"jpeg");

        let url = store.public_url(&handle).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("k/recipe_images/u-1/pie.jpg_42"));
    }

    #[tokio::test]
    async fn test_public_base_url_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(
            temp_dir.path(),
            Some("https://cdn.example.com/media/".to_string()),
            UploadPolicy::default(),
        )
        .await
        .unwrap();

        let handle = store
            .put_object("k/recipe_images/u/my cake.png_1", vec![0], "image/png")
            .await
            .unwrap();

        let url = store.public_url(&handle).await.unwrap();
        assert_eq!(
            url,
            "https://cdn.example.com/media/k/recipe_images/u/my%20cake.png_1"
        );
    }

    #[tokio::test]
    async fn test_rejected_upload_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(
            temp_dir.path(),
            None,
            UploadPolicy {
                max_bytes: Some(2),
                images_only: true,
            },
        )
        .await
        .unwrap();

        let err = store
            .put_object("k/big.png_1", vec![0; 3], "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, RecipeBoxError::UploadRejected(_)));
        assert!(!store.root_dir().join("k").exists());
    }

    #[tokio::test]
    async fn test_missing_object_has_no_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(temp_dir.path(), None, UploadPolicy::default())
            .await
            .unwrap();

        let err = store
            .public_url(&ObjectHandle {
                path: "k/nothing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeBoxError::StorageUnavailable(_)));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("a b/c%d"), "a%20b/c%25d");
        assert_eq!(encode_path("plain/path_1.png"), "plain/path_1.png");
        assert_eq!(encode_path("/tmp/blobs/k/é#1"), "/tmp/blobs/k/%C3%A9%231");
    }
}
