//! Backend selection - remote PostgreSQL when configured, in-memory mock otherwise.

use std::sync::Arc;

use uuid::Uuid;

use quill_core::domain::{Role, User, mask_email};
use quill_core::ports::{
    AuthError, ContentStore, PasswordService, RoleRepository, UserRepository,
};

use crate::database::DatabaseConfig;
use crate::memory::{InMemoryContentStore, InMemoryRoleRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use crate::database::{PostgresContentStore, PostgresRoleRepository, PostgresUserRepository};

/// Which persistence the process is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Mock => "mock",
        }
    }
}

/// The store and account repositories for one backend, chosen once at startup.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub store: Arc<dyn ContentStore>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
}

impl Backend {
    /// Seeded in-memory mock.
    pub fn in_memory() -> Self {
        Self {
            kind: BackendKind::Mock,
            store: Arc::new(InMemoryContentStore::with_mock_data()),
            users: Arc::new(InMemoryUserRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(db: sea_orm::DbConn) -> Self {
        Self {
            kind: BackendKind::Remote,
            store: Arc::new(PostgresContentStore::new(db.clone())),
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            roles: Arc::new(PostgresRoleRepository::new(db)),
        }
    }

    /// Connect to the configured database, falling back to the mock when there
    /// is no configuration or the connection fails.
    pub async fn connect(config: Option<&DatabaseConfig>) -> Self {
        #[cfg(feature = "postgres")]
        match config {
            Some(config) => match crate::database::connect(config).await {
                Ok(db) => return Self::postgres(db),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory mock.",
                        e
                    );
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running against the in-memory mock.");
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            if config.is_some() {
                tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
            }
        }

        Self::in_memory()
    }

    pub fn is_remote(&self) -> bool {
        self.kind == BackendKind::Remote
    }

    /// Ensure an admin account exists for the given credentials and holds the admin role.
    pub async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        passwords: &dyn PasswordService,
    ) -> Result<Uuid, AuthError> {
        let existing = self
            .users
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let user = match existing {
            Some(user) => user,
            None => self
                .users
                .create(User::new(email.to_string(), passwords.hash(password)?))
                .await
                .map_err(|e| AuthError::Backend(e.to_string()))?,
        };

        self.roles
            .grant(user.id, Role::Admin)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        tracing::info!(user_email = %mask_email(email), "Admin account seeded");
        Ok(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainPasswords;

    impl PasswordService for PlainPasswords {
        fn hash(&self, password: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(hash == format!("plain:{password}"))
        }
    }

    #[tokio::test]
    async fn test_missing_config_uses_mock() {
        let backend = Backend::connect(None).await;

        assert_eq!(backend.kind, BackendKind::Mock);
        assert!(!backend.store.list_published().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let backend = Backend::in_memory();

        let first = backend
            .seed_admin("admin@example.com", "pw", &PlainPasswords)
            .await
            .unwrap();
        let second = backend
            .seed_admin("admin@example.com", "pw", &PlainPasswords)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert!(backend.roles.has_role(first, Role::Admin).await.unwrap());
    }
}
