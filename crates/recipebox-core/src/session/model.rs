//! Identity and session domain models.

use serde::{Deserialize, Serialize};

/// An identity issued by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque, stable identifier.
    pub id: String,
    /// Email the identity signed up with; `None` for anonymous identities.
    pub email: Option<String>,
    pub is_anonymous: bool,
}

impl Identity {
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            is_anonymous: true,
        }
    }

    pub fn with_email(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            is_anonymous: false,
        }
    }
}

/// Opaque token the backend issues on sign-in and accepts on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential(String);

impl Credential {
    /// Creates a new [`Credential`] without checking its contents.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a successful exchange with the identity backend.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub identity: Identity,
    pub credential: Credential,
}

/// A change the identity backend made on its own: the identity behind
/// `credential` is now `identity` (`None` once the credential is revoked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChange {
    pub credential: Credential,
    pub identity: Option<Identity>,
}

/// The acting identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity_id: String,
    /// Human-facing label, e.g. the account email.
    pub display_label: Option<String>,
    pub is_anonymous: bool,
}

impl Session {
    /// Label shown to people; anonymous identities are greeted as "Guest".
    pub fn display_name(&self) -> &str {
        self.display_label.as_deref().unwrap_or("Guest")
    }
}

impl From<&Identity> for Session {
    fn from(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id.clone(),
            display_label: identity.email.clone(),
            is_anonymous: identity.is_anonymous,
        }
    }
}

/// Snapshot of the session cell.
///
/// Consumers only ever see one of these three whole states; a half-built
/// session is never published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionState {
    /// Initialization has not completed yet.
    #[default]
    Loading,
    /// Initialization completed and nobody is signed in.
    SignedOut,
    Active(Session),
}

impl SessionState {
    pub fn from_identity(identity: Option<&Identity>) -> Self {
        match identity {
            Some(identity) => Self::Active(Session::from(identity)),
            None => Self::SignedOut,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_identity() {
        let identity = Identity::with_email("u-1", "cook@example.com");
        let state = SessionState::from_identity(Some(&identity));

        let session = state.session().unwrap();
        assert_eq!(session.identity_id, "u-1");
        assert_eq!(session.display_name(), "cook@example.com");
        assert!(!session.is_anonymous);
    }

    #[test]
    fn test_anonymous_session_is_guest() {
        let identity = Identity::anonymous("anon-1");
        let session = Session::from(&identity);
        assert!(session.is_anonymous);
        assert_eq!(session.display_name(), "Guest");
    }

    #[test]
    fn test_no_identity_is_signed_out() {
        assert_eq!(SessionState::from_identity(None), SessionState::SignedOut);
        assert!(SessionState::default().is_loading());
    }
}
