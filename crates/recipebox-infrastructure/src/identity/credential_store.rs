//! Credential store implementations.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::session::{Credential, CredentialStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialFile {
    credential: Credential,
}

/// Keeps the last issued credential in a JSON file so a later process can
/// restore the same identity.
pub struct FileCredentialStore {
    file: AtomicJsonFile<CredentialFile>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicJsonFile::new(path.into()),
        }
    }

    async fn run_blocking<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(AtomicJsonFile<CredentialFile>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(file))
            .await
            .map_err(|e| RecipeBoxError::internal(format!("credential task failed: {}", e)))?
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        self.run_blocking(|file| Ok(file.load()?.map(|f| f.credential)))
            .await
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let contents = CredentialFile {
            credential: credential.clone(),
        };
        self.run_blocking(move |file| {
            file.save(&contents)?;
            restrict_permissions(file.path())?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.run_blocking(|file| match std::fs::remove_file(file.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        })
        .await
    }
}

/// Sets file permissions to 600 (user read/write only) on Unix.
fn restrict_permissions(path: &std::path::Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Credential store that only remembers for the lifetime of the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.lock().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        *self.credential.lock().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.credential.lock().await = None;
        Ok(())
    }
}
