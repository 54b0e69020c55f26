//! Recipe domain module.
//!
//! # Module Structure
//!
//! - `model`: `NewRecipe` input, `RecipeFields` stored shape, `Recipe`
//! - `normalize`: pure coercion of form text (line lists, counts)
//! - `store`: `DocumentStore` trait and collection addressing

mod model;
mod normalize;
mod store;

// Re-export public API
pub use model::{ImageAttachment, NewRecipe, Recipe, RecipeFields};
pub use normalize::{non_empty, parse_count, split_lines};
pub use store::{
    CollectionPath, DocumentStore, OrderBy, StoredDocument, next_created_at, sort_documents,
    validate_collection_root,
};
