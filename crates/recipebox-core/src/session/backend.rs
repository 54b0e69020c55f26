//! Identity backend and credential store traits.

use super::model::{AuthGrant, Credential, IdentityChange};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

/// The identity provider, seen through the narrow set of operations the
/// session lifecycle needs.
///
/// Implementations report rejected credentials as
/// [`RecipeBoxError::InvalidCredentials`](crate::error::RecipeBoxError::InvalidCredentials);
/// any other failure is treated as the backend being unreachable.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Restores the identity behind `credential`, or establishes a fresh
    /// anonymous identity when there is no credential.
    ///
    /// # Returns
    ///
    /// - `Ok(AuthGrant)`: The restored or newly created identity
    /// - `Err(InvalidCredentials)`: The credential is unknown or revoked
    /// - `Err(_)`: The backend could not be reached
    async fn restore_or_establish_anonymous(
        &self,
        credential: Option<&Credential>,
    ) -> Result<AuthGrant>;

    /// Registers a new account and signs it in.
    async fn sign_up_with_password(&self, email: &str, password: &str) -> Result<AuthGrant>;

    /// Signs in to an existing account.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthGrant>;

    /// Ends the backend-side session for `credential`, if any.
    async fn sign_out(&self, credential: Option<&Credential>) -> Result<()>;

    /// Stream of identity changes the backend originates on its own
    /// (expiry, revocation). Changes requested through this trait are not
    /// echoed. Each call returns a fresh receiver.
    fn identity_changes(&self) -> UnboundedReceiver<IdentityChange>;
}

/// Storage for the most recently issued credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads the stored credential.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Credential))`: A credential was stored
    /// - `Ok(None)`: Nothing stored
    /// - `Err(_)`: Storage could not be read
    async fn load(&self) -> Result<Option<Credential>>;

    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Removes the stored credential (no-op if none).
    async fn clear(&self) -> Result<()>;
}
