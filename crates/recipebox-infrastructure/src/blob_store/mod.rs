//! Reference `BlobStore` backends.

mod file;
mod memory;

pub use file::FileSystemBlobStore;
pub use memory::MemoryBlobStore;

use recipebox_core::config::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES};
use recipebox_core::error::{RecipeBoxError, Result};

/// Acceptance policy of the reference blob stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Largest accepted payload; `None` accepts any size.
    pub max_bytes: Option<u64>,
    /// Only accept `image/*` content types.
    pub images_only: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: Some(DEFAULT_MAX_UPLOAD_BYTES),
            images_only: true,
        }
    }
}

impl UploadPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_bytes: Some(config.max_upload_bytes),
            images_only: true,
        }
    }

    /// Accepts everything; useful for tests that are not about policy.
    pub fn permissive() -> Self {
        Self {
            max_bytes: None,
            images_only: false,
        }
    }

    pub fn check(&self, size: u64, content_type: &str) -> Result<()> {
        if let Some(max) = self.max_bytes {
            if size > max {
                return Err(RecipeBoxError::rejected(format!(
                    "file is {} bytes, the limit is {} bytes",
                    size, max
                )));
            }
        }
        if self.images_only && !content_type.starts_with("image/") {
            return Err(RecipeBoxError::rejected(format!(
                "content type '{}' is not an image",
                content_type
            )));
        }
        Ok(())
    }
}

/// Rejects object paths that are empty, absolute, or step outside the store.
fn validate_object_path(path: &str) -> Result<()> {
    let escapes = path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if path.is_empty() || path.contains('\\') || escapes {
        return Err(RecipeBoxError::rejected(format!(
            "invalid object path '{}'",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rejects_oversized_payload() {
        let policy = UploadPolicy {
            max_bytes: Some(10),
            images_only: true,
        };
        assert!(policy.check(10, "image/png").is_ok());
        let err = policy.check(11, "image/png").unwrap_err();
        assert!(matches!(err, RecipeBoxError::UploadRejected(_)));
    }

    #[test]
    fn test_policy_rejects_non_images() {
        let policy = UploadPolicy::default();
        assert!(policy.check(1, "image/jpeg").is_ok());
        assert!(policy.check(1, "application/pdf").is_err());
        assert!(UploadPolicy::permissive().check(u64::MAX, "text/plain").is_ok());
    }

    #[test]
    fn test_object_path_validation() {
        assert!(validate_object_path("k/recipe_images/u/a.png_1").is_ok());
        for bad in ["", "/abs", "a/../b", "a//b", "a\\b", "./a"] {
            assert!(validate_object_path(bad).is_err(), "path {:?}", bad);
        }
    }
}
