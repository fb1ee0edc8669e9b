//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//! This crate contains the content stores, account storage, authentication
//! and the anonymous identity resolver.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL content store and accounts via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `ip-lookup` - HTTP IP lookup services for anonymous identities

pub mod auth;
pub mod backend;
pub mod database;
pub mod identity;
pub mod memory;

// Re-exports - In-Memory
pub use memory::{
    InMemoryContentStore, InMemoryRevocationList, InMemoryRoleRepository, InMemoryUserRepository,
};

pub use auth::PasswordAuthProvider;
pub use backend::{Backend, BackendKind};
pub use database::DatabaseConfig;
pub use identity::{FileTokenStore, IdentityResolver, InMemoryTokenStore, hash_ip};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "ip-lookup")]
pub use identity::{DEFAULT_LOOKUP_SERVICES, HttpIpLookup};

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::{PostgresContentStore, PostgresRoleRepository, PostgresUserRepository};
