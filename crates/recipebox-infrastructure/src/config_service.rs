//! Configuration service implementation.
//!
//! Loads [`AppConfig`] from `config.toml` (by default
//! `~/.config/recipebox/config.toml`) and applies environment overrides.

use crate::paths::RecipeBoxPaths;
use recipebox_core::config::AppConfig;
use recipebox_core::error::{RecipeBoxError, Result};
use std::path::{Path, PathBuf};

pub const ENV_COLLECTION_ROOT: &str = "RECIPEBOX_COLLECTION_ROOT";
pub const ENV_DATA_DIR: &str = "RECIPEBOX_DATA_DIR";
pub const ENV_PUBLIC_BASE_URL: &str = "RECIPEBOX_PUBLIC_BASE_URL";

/// Configuration service that resolves the effective [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Creates a ConfigService reading the default config file location.
    pub fn new() -> Result<Self> {
        let path = RecipeBoxPaths::config_file()
            .map_err(|e| RecipeBoxError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a ConfigService reading a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file, applies `RECIPEBOX_*` environment overrides and
    /// validates the result. A missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig> {
        let config = self.load_file()?;
        let config = apply_overrides(config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_file(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            RecipeBoxError::config(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!("Loaded config from {}", self.path.display());
        Ok(config)
    }
}

/// Applies environment overrides read through `lookup`. Empty values are ignored.
pub fn apply_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(root) = lookup(ENV_COLLECTION_ROOT) {
        config.collection_root = root;
    }
    if let Some(dir) = lookup(ENV_DATA_DIR) {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(url) = lookup(ENV_PUBLIC_BASE_URL) {
        config.public_base_url = Some(url);
    }
    config
}
