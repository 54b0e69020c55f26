use super::subscription::{SessionCell, Subscription};
use recipebox_core::error::{RecipeBoxError, Result};
use recipebox_core::session::{
    AuthGrant, CredentialStore, IdentityBackend, IdentityChange, Session, SessionState,
};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owns the acting identity and its lifecycle.
///
/// `SessionManager` is responsible for:
/// - Restoring the stored credential, or establishing an anonymous identity
/// - Exchanging email/password credentials for an identity
/// - Signing out
/// - Notifying observers whenever the session changes
///
/// It is the only writer of the session state; everything else reads
/// snapshots through [`current`](Self::current), [`subscribe`](Self::subscribe)
/// or [`watch`](Self::watch).
pub struct SessionManager {
    backend: Arc<dyn IdentityBackend>,
    credentials: Arc<dyn CredentialStore>,
    cell: Arc<SessionCell>,
    ready: watch::Sender<bool>,
    pump: Mutex<Option<JoinHandle<()>>>,
    /// Held while the stored credential and the live session change together.
    transition: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Creates a `SessionManager` in the `Loading` state.
    ///
    /// # Arguments
    ///
    /// * `backend` - The identity provider
    /// * `credentials` - Where the last issued credential is kept between runs
    pub fn new(backend: Arc<dyn IdentityBackend>, credentials: Arc<dyn CredentialStore>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            backend,
            credentials,
            cell: Arc::new(SessionCell::new()),
            ready,
            pump: Mutex::new(None),
            transition: tokio::sync::Mutex::new(()),
        }
    }

    /// Restores the stored credential, or establishes an anonymous identity
    /// when there is none or the backend no longer accepts it.
    ///
    /// The ready signal fires when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the backend failure when no identity could be established; the
    /// state is then `SignedOut`.
    pub async fn initialize(&self) -> Result<SessionState> {
        self.start_pump();

        let stored = match self.credentials.load().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to load stored credential: {}", e);
                None
            }
        };

        let restored = self
            .backend
            .restore_or_establish_anonymous(stored.as_ref())
            .await;
        let grant = match restored {
            Err(e) if stored.is_some() && e.is_invalid_credentials() => {
                tracing::info!("Stored credential was rejected, continuing as a new guest");
                self.backend.restore_or_establish_anonymous(None).await
            }
            other => other,
        };

        let outcome = match grant {
            Ok(grant) => {
                let _transition = self.transition.lock().await;
                self.remember(&grant).await;
                let state = self.cell.apply_grant(&grant);
                tracing::info!(
                    identity = %grant.identity.id,
                    anonymous = grant.identity.is_anonymous,
                    "Session established"
                );
                Ok(state)
            }
            Err(e) => {
                tracing::error!("Failed to establish a session: {}", e);
                let _transition = self.transition.lock().await;
                self.cell.sign_out();
                Err(e)
            }
        };

        self.ready.send_if_modified(|ready| !std::mem::replace(ready, true));
        outcome
    }

    /// Registers a new account and makes it the current session.
    ///
    /// On failure the previous session stays current.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let email = validate_input(email, password)?;
        let grant = self.backend.sign_up_with_password(email, password).await?;
        Ok(self.adopt(grant).await)
    }

    /// Signs in to an existing account and makes it the current session.
    ///
    /// On failure the previous session stays current.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = validate_input(email, password)?;
        let grant = self.backend.sign_in_with_password(email, password).await?;
        Ok(self.adopt(grant).await)
    }

    /// Clears the current identity.
    ///
    /// No anonymous identity is established afterwards; the state stays
    /// `SignedOut` until [`initialize`](Self::initialize) runs again. A backend
    /// failure is logged and does not keep the identity signed in locally.
    pub async fn sign_out(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        let credential = self.cell.credential();
        if let Err(e) = self.backend.sign_out(credential.as_ref()).await {
            tracing::warn!("Identity backend sign-out failed: {}", e);
        }
        if let Err(e) = self.credentials.clear().await {
            tracing::warn!("Failed to clear stored credential: {}", e);
        }
        self.cell.sign_out();
        tracing::info!("Signed out");
        Ok(())
    }

    /// Returns the current snapshot without waiting.
    pub fn current(&self) -> SessionState {
        self.cell.current()
    }

    /// Waits until [`initialize`](Self::initialize) has completed once, then
    /// returns the current snapshot.
    pub async fn wait_ready(&self) -> SessionState {
        let mut ready = self.ready.subscribe();
        // The sender lives as long as `self`, so this only ends once ready.
        let _ = ready.wait_for(|ready| *ready).await;
        self.current()
    }

    /// Returns true when a credential from an earlier run is waiting to be
    /// restored. A store that cannot be read counts as empty.
    pub async fn has_stored_credential(&self) -> bool {
        match self.credentials.load().await {
            Ok(stored) => stored.is_some(),
            Err(e) => {
                tracing::warn!("Failed to load stored credential: {}", e);
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Registers `callback` to be called with every new session snapshot.
    ///
    /// The current snapshot is delivered immediately, before this returns.
    /// Snapshots arrive in the order they were published and consecutive
    /// duplicates are skipped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.cell.subscribe(callback)
    }

    /// Returns a receiver that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.cell.watch()
    }

    async fn adopt(&self, grant: AuthGrant) -> Session {
        self.start_pump();
        let _transition = self.transition.lock().await;
        self.remember(&grant).await;
        self.cell.apply_grant(&grant);
        tracing::info!(identity = %grant.identity.id, "Signed in");
        Session::from(&grant.identity)
    }

    async fn remember(&self, grant: &AuthGrant) {
        if let Err(e) = self.credentials.save(&grant.credential).await {
            tracing::warn!("Failed to store credential: {}", e);
        }
    }

    /// Starts forwarding backend-originated identity changes, once.
    fn start_pump(&self) {
        let mut pump = match self.pump.lock() {
            Ok(pump) => pump,
            Err(poisoned) => poisoned.into_inner(),
        };
        if pump.is_none() {
            let changes = self.backend.identity_changes();
            *pump = Some(tokio::spawn(pump_changes(
                changes,
                Arc::downgrade(&self.cell),
                self.credentials.clone(),
            )));
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let pump = match self.pump.get_mut() {
            Ok(pump) => pump.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = pump {
            handle.abort();
        }
    }
}

async fn pump_changes(
    mut changes: UnboundedReceiver<IdentityChange>,
    cell: Weak<SessionCell>,
    credentials: Arc<dyn CredentialStore>,
) {
    while let Some(change) = changes.recv().await {
        let Some(cell) = cell.upgrade() else {
            break;
        };
        let revoked = change.identity.is_none();
        if !cell.apply_change(change) {
            tracing::debug!("Ignoring identity change for a superseded credential");
            continue;
        }
        if revoked {
            tracing::info!("Identity backend ended the session");
            if let Err(e) = credentials.clear().await {
                tracing::warn!("Failed to clear stored credential: {}", e);
            }
        }
    }
}

/// Trims the email and rejects blank input before it reaches the backend.
fn validate_input<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(RecipeBoxError::invalid_credentials(
            "Please enter an email and a password.",
        ));
    }
    Ok(email)
}
