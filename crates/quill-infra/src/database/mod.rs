//! PostgreSQL persistence via SeaORM.

mod connections;

#[cfg(feature = "postgres")]
mod content_store;
#[cfg(feature = "postgres")]
mod users;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use content_store::PostgresContentStore;
#[cfg(feature = "postgres")]
pub use users::{PostgresRoleRepository, PostgresUserRepository};

#[cfg(feature = "postgres")]
use quill_core::RepoError;

/// Map a SeaORM error, recognising unique-constraint violations.
#[cfg(feature = "postgres")]
pub(crate) fn map_db_err(e: sea_orm::DbErr) -> RepoError {
    let message = e.to_string();
    if message.contains("duplicate") || message.contains("unique") {
        RepoError::Constraint(message)
    } else if matches!(e, sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)) {
        RepoError::Connection(message)
    } else {
        RepoError::Query(message)
    }
}

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
