//! Recipe persistence.

use crate::media_uploader::MediaUploader;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::recipe::{
    CollectionPath, DocumentStore, NewRecipe, OrderBy, Recipe, RecipeFields,
};
use recipebox_core::session::SessionState;
use std::sync::Arc;

/// Creates and lists recipes in the shared recipe collection.
///
/// The collection lives at `{collection_root}/public/data/recipes`. Writes
/// need an active session and are attributed to it; reads are public.
pub struct RecipeRepository {
    store: Arc<dyn DocumentStore>,
    uploader: Arc<MediaUploader>,
    collection: CollectionPath,
}

impl RecipeRepository {
    /// # Errors
    ///
    /// Returns `Config` if `collection_root` is not a valid partition key.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        uploader: Arc<MediaUploader>,
        collection_root: &str,
    ) -> Result<Self> {
        Ok(Self {
            store,
            uploader,
            collection: CollectionPath::recipes(collection_root)?,
        })
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Normalizes `input`, uploads its image if any, and stores the recipe.
    ///
    /// Returns the id the store assigned.
    ///
    /// # Errors
    ///
    /// - `NotReady`: The session is still loading
    /// - `Unauthenticated`: Nobody is signed in
    /// - `MediaUploadFailed`: The image could not be stored; nothing was written
    /// - `PersistenceFailed`: The document store refused the write
    pub async fn create(&self, input: &NewRecipe, session: &SessionState) -> Result<String> {
        let author = match session {
            SessionState::Loading => {
                return Err(RecipeBoxError::not_ready("session is still loading"));
            }
            SessionState::SignedOut => return Err(RecipeBoxError::Unauthenticated),
            SessionState::Active(author) => author,
        };

        let image_url = match &input.image {
            Some(image) => {
                let uploaded = self
                    .uploader
                    .upload(image.bytes.clone(), &author.identity_id, &image.file_name)
                    .await
                    .map_err(RecipeBoxError::media_upload_failed)?;
                Some(uploaded.url)
            }
            None => None,
        };

        let fields = RecipeFields::normalize(input, author, image_url)
            .into_document_fields()
            .map_err(|e| persistence_failure("Failed to add recipe", e))?;
        let document = self
            .store
            .insert(&self.collection, fields)
            .await
            .map_err(|e| persistence_failure("Failed to add recipe", e))?;

        tracing::info!(
            id = %document.id,
            author = %author.identity_id,
            "Recipe added"
        );
        Ok(document.id)
    }

    /// Returns every recipe, newest first.
    ///
    /// Recipes created in the same instant are listed latest-insert first.
    pub async fn list(&self) -> Result<Vec<Recipe>> {
        let documents = self
            .store
            .query_all(&self.collection, OrderBy::CreatedAtDesc)
            .await
            .map_err(|e| persistence_failure("Failed to fetch recipes", e))?;

        let recipes = documents
            .into_iter()
            .map(Recipe::try_from)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| persistence_failure("Failed to fetch recipes", e))?;

        tracing::debug!(count = recipes.len(), "Fetched recipes");
        Ok(recipes)
    }
}

fn persistence_failure(action: &str, error: RecipeBoxError) -> RecipeBoxError {
    let reason = match error {
        RecipeBoxError::PersistenceFailed(reason) => reason,
        other => other.to_string(),
    };
    RecipeBoxError::persistence(format!("{}: {}", action, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebox_core::session::{Identity, Session};
    use recipebox_infrastructure::blob_store::{MemoryBlobStore, UploadPolicy};
    use recipebox_infrastructure::document_store::MemoryDocumentStore;

    fn repository() -> (RecipeRepository, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new(UploadPolicy::default()));
        let uploader = Arc::new(MediaUploader::new(blobs.clone(), "kitchen"));
        let repository =
            RecipeRepository::new(Arc::new(MemoryDocumentStore::new()), uploader, "kitchen")
                .unwrap();
        (repository, blobs)
    }

    fn signed_in(id: &str) -> SessionState {
        SessionState::Active(Session::from(&Identity::with_email(
            id,
            format!("{}@example.com", id),
        )))
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let (repository, _) = repository();
        let input = NewRecipe {
            name: "  Pancakes ".to_string(),
            ingredients: "flour\r\n\r\nmilk\n  \neggs".to_string(),
            instructions: "mix\n\nfry".to_string(),
            prep_time: "10 min".to_string(),
            cook_time: "abc".to_string(),
            servings: "-2".to_string(),
            category: "  ".to_string(),
            ..Default::default()
        };

        let id = repository.create(&input, &signed_in("u-1")).await.unwrap();

        let recipes = repository.list().await.unwrap();
        assert_eq!(recipes.len(), 1);
        let recipe = &recipes[0];
        assert_eq!(recipe.id, id);
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.ingredients, vec!["flour", "milk", "eggs"]);
        assert_eq!(recipe.instructions, vec!["mix", "fry"]);
        assert_eq!(recipe.prep_time_minutes, 10);
        assert_eq!(recipe.cook_time_minutes, 0);
        assert_eq!(recipe.servings, 0);
        assert_eq!(recipe.category, None);
        assert_eq!(recipe.author_id, "u-1");
        assert_eq!(recipe.author_label.as_deref(), Some("u-1@example.com"));
    }

    #[tokio::test]
    async fn test_create_while_loading_is_not_ready() {
        let (repository, _) = repository();
        let err = repository
            .create(&NewRecipe::default(), &SessionState::Loading)
            .await
            .unwrap_err();
        assert!(err.is_not_ready());
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_url_is_stored() {
        let (repository, blobs) = repository();
        let input = NewRecipe {
            name: "Cake".to_string(),
            image: Some(recipebox_core::recipe::ImageAttachment {
                file_name: "cake.png".to_string(),
                bytes: vec![0x89, 0x50],
            }),
            ..Default::default()
        };

        repository.create(&input, &signed_in("u-1")).await.unwrap();

        let recipe = repository.list().await.unwrap().remove(0);
        let url = recipe.image_url.unwrap();
        assert!(url.starts_with("memory://kitchen/recipe_images/u-1/cake.png_"));
        assert_eq!(blobs.len().await, 1);
    }

    #[test]
    fn test_persistence_failure_wording() {
        let err = persistence_failure("Failed to add recipe", RecipeBoxError::io("disk full"));
        assert_eq!(err.user_message(), "Failed to add recipe: IO error: disk full");

        let err = persistence_failure(
            "Failed to fetch recipes",
            RecipeBoxError::persistence("document 'x' is malformed"),
        );
        assert_eq!(
            err.user_message(),
            "Failed to fetch recipes: document 'x' is malformed"
        );
    }

    #[test]
    fn test_invalid_collection_root_is_rejected() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let uploader = Arc::new(MediaUploader::new(blobs, "a/b"));
        let result = RecipeRepository::new(Arc::new(MemoryDocumentStore::new()), uploader, "a/b");
        assert!(result.is_err());
    }
}
