//! Application layer for RecipeBox.
//!
//! Session lifecycle, recipe persistence and image uploads, wired together
//! by [`AppContext`].

pub mod context;
pub mod media_uploader;
pub mod recipe_repository;
pub mod session;

pub use context::{AppContext, Backends};
pub use media_uploader::MediaUploader;
pub use recipe_repository::RecipeRepository;
pub use session::{SessionManager, Subscription};
