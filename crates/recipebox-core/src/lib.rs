pub mod config;
pub mod error;
pub mod media;
pub mod recipe;
pub mod session;

// Re-export common error type
pub use error::RecipeBoxError;
