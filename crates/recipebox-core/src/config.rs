use crate::error::Result;
use crate::recipe::validate_collection_root;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default partition key for all recipe records and images.
pub const DEFAULT_COLLECTION_ROOT: &str = "recipebox";

/// Default upload limit enforced by the reference blob stores (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Deployment configuration (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Partition key scoping every record to this deployment.
    pub collection_root: String,
    /// Where file-backed stores live. `None` means the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Base URL under which stored images are served, if any.
    pub public_base_url: Option<String>,
    pub max_upload_bytes: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collection_root: DEFAULT_COLLECTION_ROOT.to_string(),
            data_dir: None,
            public_base_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        validate_collection_root(&self.collection_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("collection_root = \"kitchen\"").unwrap();
        assert_eq!(config.collection_root, "kitchen");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_log_format() {
        let config: AppConfig = toml::from_str("log_format = \"json\"").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_collection_root() {
        let config = AppConfig {
            collection_root: "a/b".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
