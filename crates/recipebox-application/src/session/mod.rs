//! Session lifecycle.

mod manager;
mod subscription;

pub use manager::SessionManager;
pub use subscription::Subscription;
