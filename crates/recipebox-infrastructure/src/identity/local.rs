//! Local identity backend.
//!
//! Keeps an account registry (email/password accounts and anonymous
//! identities) plus the credentials issued for them, either in memory or in a
//! JSON file shared by every process using the same data directory.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::session::{AuthGrant, Credential, Identity, IdentityBackend, IdentityChange};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

const SIGN_IN_REJECTED: &str = "Invalid email or password.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    identity_id: String,
    email: String,
    password_salt: String,
    password_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Registry {
    /// Keyed by lower-cased email.
    accounts: HashMap<String, Account>,
    anonymous: Vec<String>,
    /// Issued credential token → identity id.
    credentials: HashMap<String, String>,
}

impl Registry {
    fn identity(&self, identity_id: &str) -> Option<Identity> {
        if let Some(account) = self
            .accounts
            .values()
            .find(|a| a.identity_id == identity_id)
        {
            return Some(Identity::with_email(&account.identity_id, &account.email));
        }
        self.anonymous
            .iter()
            .find(|id| id.as_str() == identity_id)
            .map(Identity::anonymous)
    }

    fn issue(&mut self, identity: Identity) -> AuthGrant {
        let credential = new_token();
        self.credentials
            .insert(credential.as_str().to_string(), identity.id.clone());
        AuthGrant {
            identity,
            credential,
        }
    }
}

enum RegistryStore {
    Memory(Mutex<Registry>),
    File(AtomicJsonFile<Registry>),
}

/// Identity backend backed by a local account registry.
pub struct LocalIdentityBackend {
    store: RegistryStore,
    listeners: std::sync::Mutex<Vec<UnboundedSender<IdentityChange>>>,
}

impl LocalIdentityBackend {
    pub fn in_memory() -> Self {
        Self::with_store(RegistryStore::Memory(Mutex::new(Registry::default())))
    }

    /// Creates a backend persisting its registry to `path`.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self::with_store(RegistryStore::File(AtomicJsonFile::new(path.into())))
    }

    fn with_store(store: RegistryStore) -> Self {
        Self {
            store,
            listeners: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Runs `f` against the registry as one transaction.
    ///
    /// For the file store the registry is re-read under an exclusive lock and
    /// written back afterwards.
    async fn transact<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Registry) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        match &self.store {
            RegistryStore::Memory(registry) => {
                let mut registry = registry.lock().await;
                f(&mut *registry)
            }
            RegistryStore::File(file) => {
                let file = file.clone();
                tokio::task::spawn_blocking(move || {
                    file.update(Registry::default(), |registry| Ok(f(registry)))
                })
                .await
                .map_err(|e| RecipeBoxError::internal(format!("identity task failed: {}", e)))??
            }
        }
    }

    /// Revokes `credential`, notifying `identity_changes` listeners.
    ///
    /// This is the backend acting on its own (e.g. an administrator ending a
    /// session), as opposed to the holder signing out.
    pub async fn revoke(&self, credential: &Credential) -> Result<()> {
        let token = credential.as_str().to_string();
        let removed = self
            .transact(move |registry| Ok(registry.credentials.remove(&token).is_some()))
            .await?;

        if removed {
            tracing::info!("Revoked a credential");
            self.notify(IdentityChange {
                credential: credential.clone(),
                identity: None,
            });
        }
        Ok(())
    }

    fn notify(&self, change: IdentityChange) {
        let mut listeners = match self.listeners.lock() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[async_trait]
impl IdentityBackend for LocalIdentityBackend {
    async fn restore_or_establish_anonymous(
        &self,
        credential: Option<&Credential>,
    ) -> Result<AuthGrant> {
        match credential {
            Some(credential) => {
                let credential = credential.clone();
                self.transact(move |registry| {
                    let identity = registry
                        .credentials
                        .get(credential.as_str())
                        .and_then(|id| registry.identity(id))
                        .ok_or_else(|| {
                            RecipeBoxError::invalid_credentials(
                                "Your sign-in has expired. Please sign in again.",
                            )
                        })?;
                    Ok(AuthGrant {
                        identity,
                        credential,
                    })
                })
                .await
            }
            None => {
                self.transact(|registry| {
                    let identity = Identity::anonymous(Uuid::new_v4().to_string());
                    registry.anonymous.push(identity.id.clone());
                    Ok(registry.issue(identity))
                })
                .await
            }
        }
    }

    async fn sign_up_with_password(&self, email: &str, password: &str) -> Result<AuthGrant> {
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RecipeBoxError::invalid_credentials(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let email = email.to_string();
        let salt = random_bytes::<16>();
        let password_hash = hash_password(&salt, password);
        self.transact(move |registry| {
            let key = email.to_lowercase();
            if registry.accounts.contains_key(&key) {
                return Err(RecipeBoxError::invalid_credentials(
                    "That email address is already in use.",
                ));
            }
            let account = Account {
                identity_id: Uuid::new_v4().to_string(),
                email,
                password_salt: STANDARD.encode(salt),
                password_hash,
            };
            let identity = Identity::with_email(&account.identity_id, &account.email);
            registry.accounts.insert(key, account);
            Ok(registry.issue(identity))
        })
        .await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthGrant> {
        let key = email.to_lowercase();
        let password = password.to_string();
        self.transact(move |registry| {
            let account = registry
                .accounts
                .get(&key)
                .ok_or_else(|| RecipeBoxError::invalid_credentials(SIGN_IN_REJECTED))?;
            let salt = STANDARD
                .decode(&account.password_salt)
                .map_err(|e| RecipeBoxError::internal(format!("corrupt password salt: {}", e)))?;
            if !constant_time_eq(
                hash_password(&salt, &password).as_bytes(),
                account.password_hash.as_bytes(),
            ) {
                return Err(RecipeBoxError::invalid_credentials(SIGN_IN_REJECTED));
            }
            let identity = Identity::with_email(&account.identity_id, &account.email);
            Ok(registry.issue(identity))
        })
        .await
    }

    async fn sign_out(&self, credential: Option<&Credential>) -> Result<()> {
        let Some(credential) = credential else {
            return Ok(());
        };
        let token = credential.as_str().to_string();
        self.transact(move |registry| {
            registry.credentials.remove(&token);
            Ok(())
        })
        .await
    }

    fn identity_changes(&self) -> UnboundedReceiver<IdentityChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RecipeBoxError::invalid_credentials(
            "The email address is badly formatted.",
        ))
    }
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn new_token() -> Credential {
    Credential::new(URL_SAFE_NO_PAD.encode(random_bytes::<32>()))
}

fn hash_password(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_anonymous_identity_is_restorable() {
        let backend = LocalIdentityBackend::in_memory();

        let grant = backend.restore_or_establish_anonymous(None).await.unwrap();
        assert!(grant.identity.is_anonymous);

        let restored = backend
            .restore_or_establish_anonymous(Some(&grant.credential))
            .await
            .unwrap();
        assert_eq!(restored.identity, grant.identity);
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let backend = LocalIdentityBackend::in_memory();

        let signed_up = backend
            .sign_up_with_password("Cook@Example.com", "secret1")
            .await
            .unwrap();
        let signed_in = backend
            .sign_in_with_password("cook@example.com", "secret1")
            .await
            .unwrap();

        assert_eq!(signed_up.identity, signed_in.identity);
        assert_eq!(signed_in.identity.email.as_deref(), Some("Cook@Example.com"));
        assert_ne!(signed_up.credential, signed_in.credential);
    }

    #[tokio::test]
    async fn test_rejections_are_invalid_credentials() {
        let backend = LocalIdentityBackend::in_memory();
        backend
            .sign_up_with_password("a@b.c", "secret1")
            .await
            .unwrap();

        let cases = [
            backend.sign_up_with_password("a@b.c", "another1").await,
            backend.sign_up_with_password("not-an-email", "secret1").await,
            backend.sign_up_with_password("x@y.z", "short").await,
            backend.sign_in_with_password("a@b.c", "wrong-password").await,
            backend.sign_in_with_password("nobody@b.c", "secret1").await,
        ];
        for result in cases {
            assert!(result.unwrap_err().is_invalid_credentials());
        }
    }

    #[tokio::test]
    async fn test_signed_out_credential_cannot_restore() {
        let backend = LocalIdentityBackend::in_memory();
        let grant = backend
            .sign_up_with_password("a@b.c", "secret1")
            .await
            .unwrap();

        backend.sign_out(Some(&grant.credential)).await.unwrap();

        let err = backend
            .restore_or_establish_anonymous(Some(&grant.credential))
            .await
            .unwrap_err();
        assert!(err.is_invalid_credentials());
    }

    #[tokio::test]
    async fn test_revoke_notifies_listeners() {
        let backend = LocalIdentityBackend::in_memory();
        let mut changes = backend.identity_changes();
        let grant = backend.restore_or_establish_anonymous(None).await.unwrap();

        backend.revoke(&grant.credential).await.unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.credential, grant.credential);
        assert_eq!(change.identity, None);
    }

    #[tokio::test]
    async fn test_file_registry_is_shared_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("accounts.json");

        let grant = LocalIdentityBackend::with_file(&path)
            .sign_up_with_password("a@b.c", "secret1")
            .await
            .unwrap();

        let other = LocalIdentityBackend::with_file(&path);
        let restored = other
            .restore_or_establish_anonymous(Some(&grant.credential))
            .await
            .unwrap();
        assert_eq!(restored.identity, grant.identity);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret1"));
    }

    #[test]
    fn test_password_hash_depends_on_salt() {
        assert_ne!(hash_password(b"salt-a", "pw"), hash_password(b"salt-b", "pw"));
        assert_eq!(hash_password(b"salt-a", "pw"), hash_password(b"salt-a", "pw"));
    }
}
