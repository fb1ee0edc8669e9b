//! In-memory implementations - used when no database is configured, and in tests.
//!
//! Data is lost on process restart.

mod accounts;
mod content_store;
mod revocation;

pub use accounts::{InMemoryRoleRepository, InMemoryUserRepository};
pub use content_store::InMemoryContentStore;
pub use revocation::InMemoryRevocationList;
