//! Reference identity backend and credential stores.

mod credential_store;
mod local;

pub use credential_store::{FileCredentialStore, MemoryCredentialStore};
pub use local::{LocalIdentityBackend, MIN_PASSWORD_LEN};
