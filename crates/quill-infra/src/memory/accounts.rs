//! In-memory user and role repositories.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{Role, User};
use quill_core::ports::{RoleRepository, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepoError::Constraint("email already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemoryRoleRepository {
    grants: RwLock<HashSet<(Uuid, Role)>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepoError> {
        Ok(self.grants.read().await.contains(&(user_id, role)))
    }

    async fn grant(&self, user_id: Uuid, role: Role) -> Result<(), RepoError> {
        self.grants.write().await.insert((user_id, role));
        Ok(())
    }

    async fn revoke(&self, user_id: Uuid, role: Role) -> Result<(), RepoError> {
        self.grants.write().await.remove(&(user_id, role));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(User::new("a@example.com".into(), "h".into()))
            .await
            .unwrap();

        let result = repo
            .create(User::new("A@example.com".into(), "h".into()))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_grant_and_revoke_are_idempotent() {
        let roles = InMemoryRoleRepository::new();
        let user = Uuid::new_v4();

        roles.grant(user, Role::Admin).await.unwrap();
        roles.grant(user, Role::Admin).await.unwrap();
        assert!(roles.has_role(user, Role::Admin).await.unwrap());

        roles.revoke(user, Role::Admin).await.unwrap();
        roles.revoke(user, Role::Admin).await.unwrap();
        assert!(!roles.has_role(user, Role::Admin).await.unwrap());
    }
}
