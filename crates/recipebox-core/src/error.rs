//! Error types for RecipeBox.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every RecipeBox component.
///
/// Each component catches backend failures at its boundary and returns one of
/// these variants; nothing below the binary is allowed to panic on a failed
/// backend call.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecipeBoxError {
    /// A write was attempted without an active identity.
    #[error("Not signed in")]
    Unauthenticated,

    /// The identity backend rejected a sign-in or sign-up.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// An image upload failed, aborting the recipe it belonged to.
    ///
    /// The wrapped error is the blob store failure
    /// (`StorageUnavailable` or `UploadRejected`).
    #[error("Media upload failed: {0}")]
    MediaUploadFailed(Box<RecipeBoxError>),

    /// The blob store could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The blob store refused the payload.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// The document store failed to write or read.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// An operation ran before the session finished initializing.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecipeBoxError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidCredentials error
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials(message.into())
    }

    /// Wraps a blob store failure as a MediaUploadFailed error
    pub fn media_upload_failed(cause: RecipeBoxError) -> Self {
        Self::MediaUploadFailed(Box::new(cause))
    }

    /// Creates a StorageUnavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    /// Creates an UploadRejected error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::UploadRejected(message.into())
    }

    /// Creates a PersistenceFailed error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceFailed(message.into())
    }

    /// Creates a NotReady error
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials(_))
    }

    pub fn is_media_upload_failed(&self) -> bool {
        matches!(self, Self::MediaUploadFailed(_))
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    pub fn is_persistence_failed(&self) -> bool {
        matches!(self, Self::PersistenceFailed(_))
    }

    /// Returns the blob store failure behind a MediaUploadFailed error.
    pub fn upload_cause(&self) -> Option<&RecipeBoxError> {
        match self {
            Self::MediaUploadFailed(cause) => Some(cause),
            _ => None,
        }
    }

    /// Short message suitable for showing to the person who triggered the failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "You must be logged in to add a recipe.".to_string(),
            Self::InvalidCredentials(reason) => reason.clone(),
            Self::MediaUploadFailed(cause) => {
                format!("Failed to upload image: {}", cause.detail())
            }
            Self::StorageUnavailable(_) | Self::UploadRejected(_) => {
                format!("Failed to upload image: {}", self.detail())
            }
            // Repository operations phrase the reason themselves ("Failed to add recipe: ...").
            Self::PersistenceFailed(reason) => reason.clone(),
            Self::NotReady(_) => "Still connecting, please try again in a moment.".to_string(),
            Self::Config(reason) => format!("Configuration problem: {}", reason),
            Self::Io { .. } | Self::Serialization { .. } | Self::Internal(_) => {
                format!("Something went wrong: {}", self)
            }
        }
    }

    /// The payload of a message-carrying variant, without the variant prefix.
    fn detail(&self) -> String {
        match self {
            Self::StorageUnavailable(m) | Self::UploadRejected(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RecipeBoxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RecipeBoxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RecipeBoxError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error, used where backends report untyped failures
impl From<anyhow::Error> for RecipeBoxError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, RecipeBoxError>`.
pub type Result<T> = std::result::Result<T, RecipeBoxError>;
