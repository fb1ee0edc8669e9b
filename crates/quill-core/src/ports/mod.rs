//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod content_store;
mod identity;
mod repository;

pub use auth::{
    AuthError, AuthProvider, PasswordService, RevocationList, Session, TokenClaims, TokenService,
};
pub use content_store::ContentStore;
pub use identity::{IdentityError, IpLookup, TokenStore};
pub use repository::{RoleRepository, UserRepository};
