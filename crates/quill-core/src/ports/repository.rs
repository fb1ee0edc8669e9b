use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::error::RepoError;

/// Account storage used by the password auth provider.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new user. Fails with `RepoError::Constraint` if the email is taken.
    async fn create(&self, user: User) -> Result<User, RepoError>;
}

/// Server-side role-assignment table.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Whether a (user, role) row exists.
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepoError>;

    /// Idempotent grant.
    async fn grant(&self, user_id: Uuid, role: Role) -> Result<(), RepoError>;

    /// Idempotent revoke.
    async fn revoke(&self, user_id: Uuid, role: Role) -> Result<(), RepoError>;
}
