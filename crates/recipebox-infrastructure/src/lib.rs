pub mod blob_store;
pub mod config_service;
pub mod document_store;
pub mod identity;
pub mod paths;
pub mod storage;

pub use crate::blob_store::{FileSystemBlobStore, MemoryBlobStore, UploadPolicy};
pub use crate::config_service::ConfigService;
pub use crate::document_store::{FileDocumentStore, MemoryDocumentStore};
pub use crate::identity::{FileCredentialStore, LocalIdentityBackend, MemoryCredentialStore};
pub use crate::paths::RecipeBoxPaths;
