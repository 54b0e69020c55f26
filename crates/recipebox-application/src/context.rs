use crate::media_uploader::MediaUploader;
use crate::recipe_repository::RecipeRepository;
use crate::session::SessionManager;
use recipebox_core::config::AppConfig;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::media::BlobStore;
use recipebox_core::recipe::DocumentStore;
use recipebox_core::session::{CredentialStore, IdentityBackend};
use recipebox_infrastructure::blob_store::{FileSystemBlobStore, MemoryBlobStore, UploadPolicy};
use recipebox_infrastructure::document_store::{FileDocumentStore, MemoryDocumentStore};
use recipebox_infrastructure::identity::{
    FileCredentialStore, LocalIdentityBackend, MemoryCredentialStore,
};
use recipebox_infrastructure::paths::RecipeBoxPaths;
use std::sync::Arc;

/// The backing services a context is assembled from.
pub struct Backends {
    pub identity: Arc<dyn IdentityBackend>,
    pub credentials: Arc<dyn CredentialStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// In-memory backends; nothing outlives the process.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self {
            identity: Arc::new(LocalIdentityBackend::in_memory()),
            credentials: Arc::new(MemoryCredentialStore::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            blobs: Arc::new(MemoryBlobStore::new(UploadPolicy::from_config(config))),
        }
    }

    /// File-system backends under the configured data directory.
    pub async fn file_system(config: &AppConfig) -> Result<Self> {
        let paths =
            RecipeBoxPaths::from_config(config).map_err(|e| RecipeBoxError::config(e.to_string()))?;
        tracing::debug!("Using data directory {}", paths.data_dir().display());

        let documents = FileDocumentStore::new(paths.documents_dir()).await?;
        let blobs = FileSystemBlobStore::new(
            paths.blobs_dir(),
            config.public_base_url.clone(),
            UploadPolicy::from_config(config),
        )
        .await?;

        Ok(Self {
            identity: Arc::new(LocalIdentityBackend::with_file(paths.accounts_file())),
            credentials: Arc::new(FileCredentialStore::new(paths.credential_file())),
            documents: Arc::new(documents),
            blobs: Arc::new(blobs),
        })
    }
}

/// Composition root: builds the session manager, uploader and repository once
/// and hands out shared references.
pub struct AppContext {
    config: AppConfig,
    session: Arc<SessionManager>,
    uploader: Arc<MediaUploader>,
    recipes: Arc<RecipeRepository>,
}

impl AppContext {
    /// Wires the components together. Does not initialize the session.
    pub fn new(config: AppConfig, backends: Backends) -> Result<Self> {
        config.validate()?;

        let session = Arc::new(SessionManager::new(backends.identity, backends.credentials));
        let uploader = Arc::new(MediaUploader::new(
            backends.blobs,
            config.collection_root.clone(),
        ));
        let recipes = Arc::new(RecipeRepository::new(
            backends.documents,
            uploader.clone(),
            &config.collection_root,
        )?);

        Ok(Self {
            config,
            session,
            uploader,
            recipes,
        })
    }

    pub fn ephemeral(config: AppConfig) -> Result<Self> {
        let backends = Backends::in_memory(&config);
        Self::new(config, backends)
    }

    pub async fn file_backed(config: AppConfig) -> Result<Self> {
        let backends = Backends::file_system(&config).await?;
        Self::new(config, backends)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn uploader(&self) -> &Arc<MediaUploader> {
        &self.uploader
    }

    pub fn recipes(&self) -> &Arc<RecipeRepository> {
        &self.recipes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebox_core::recipe::NewRecipe;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig {
            collection_root: "kitchen".to_string(),
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ephemeral_context_round_trip() {
        let context = AppContext::ephemeral(AppConfig::default()).unwrap();
        let state = context.session().initialize().await.unwrap();

        let input = NewRecipe {
            name: "Toast".to_string(),
            ..Default::default()
        };
        context.recipes().create(&input, &state).await.unwrap();

        assert_eq!(context.recipes().list().await.unwrap().len(), 1);
        assert_eq!(
            context.recipes().collection().as_str(),
            "recipebox/public/data/recipes"
        );
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = AppConfig {
            collection_root: String::new(),
            ..Default::default()
        };
        assert!(AppContext::ephemeral(config).is_err());
    }

    #[tokio::test]
    async fn test_parent_dir_collection_root_is_rejected() {
        for root in [".", ".."] {
            let config = AppConfig {
                collection_root: root.to_string(),
                ..Default::default()
            };
            let err = AppContext::ephemeral(config).err().unwrap();
            assert!(matches!(err, RecipeBoxError::Config(_)));
        }
    }

    #[tokio::test]
    async fn test_file_backed_context_survives_restart() {
        let temp_dir = TempDir::new().unwrap();

        let first = AppContext::file_backed(config_in(&temp_dir)).await.unwrap();
        let account = first
            .session()
            .sign_up("cook@example.com", "secret1")
            .await
            .unwrap();
        let input = NewRecipe {
            name: "Soup".to_string(),
            ..Default::default()
        };
        let state = first.session().current();
        let id = first.recipes().create(&input, &state).await.unwrap();
        drop(first);

        let second = AppContext::file_backed(config_in(&temp_dir)).await.unwrap();
        let state = second.session().initialize().await.unwrap();
        assert_eq!(state.session(), Some(&account));

        let recipes = second.recipes().list().await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].id, id);
        assert_eq!(recipes[0].author_id, account.identity_id);
    }
}
