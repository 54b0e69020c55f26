//! Session domain module.
//!
//! This module contains the identity/session models and the interfaces of the
//! backends the session lifecycle talks to.
//!
//! # Module Structure
//!
//! - `model`: `Identity`, `Credential`, `Session`, `SessionState`
//! - `backend`: `IdentityBackend` and `CredentialStore` traits

mod backend;
mod model;

// Re-export public API
pub use backend::{CredentialStore, IdentityBackend};
pub use model::{AuthGrant, Credential, Identity, IdentityChange, Session, SessionState};
