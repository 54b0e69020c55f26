//! Unified path management for recipebox configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/recipebox/          # Config directory
//! └── config.toml               # Application configuration
//!
//! <data_dir>/                   # ~/.local/share/recipebox unless configured
//! ├── documents/                # Document store collections (one JSON file each)
//! ├── blobs/                    # Blob store objects
//! ├── accounts.json             # Local identity backend registry
//! └── credential.json           # Last issued credential
//! ```

use recipebox_core::config::AppConfig;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "recipebox";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution for one deployment's data directory.
#[derive(Debug, Clone)]
pub struct RecipeBoxPaths {
    data_dir: PathBuf,
}

impl RecipeBoxPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Uses the configured data directory, falling back to the platform one.
    pub fn from_config(config: &AppConfig) -> Result<Self, PathError> {
        match &config.data_dir {
            Some(dir) => Ok(Self::new(dir.clone())),
            None => Ok(Self::new(Self::default_data_dir()?)),
        }
    }

    /// Returns the recipebox configuration directory (e.g. `~/.config/recipebox/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the platform data directory (e.g. `~/.local/share/recipebox/`).
    pub fn default_data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.data_dir.join("accounts.json")
    }

    /// # Security Note
    ///
    /// The credential grants access to the signed-in account; the store
    /// writing it restricts permissions to the owner on Unix.
    pub fn credential_file(&self) -> PathBuf {
        self.data_dir.join("credential.json")
    }
}
