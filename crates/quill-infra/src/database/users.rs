//! PostgreSQL account and role repositories.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{Role, User, mask_email};
use quill_core::ports::{RoleRepository, UserRepository};

use super::entity::user::{self, Entity as UserEntity};
use super::entity::user_role::{self, Entity as UserRoleEntity};
use super::map_db_err;

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = user.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }
}

/// Role assignments in the `user_roles` table.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    db: DbConn,
}

impl PostgresRoleRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepoError> {
        let grant = UserRoleEntity::find_by_id((user_id, role.as_str().to_string()))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(grant.is_some())
    }

    async fn grant(&self, user_id: Uuid, role: Role) -> Result<(), RepoError> {
        UserRoleEntity::insert(user_role::ActiveModel {
            user_id: Set(user_id),
            role: Set(role.as_str().to_string()),
            created_at: Set(Utc::now().into()),
        })
        .on_conflict(
            OnConflict::columns([user_role::Column::UserId, user_role::Column::Role])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(map_db_err)?;

        tracing::info!(user_id = %user_id, role = %role, "Role granted");
        Ok(())
    }

    async fn revoke(&self, user_id: Uuid, role: Role) -> Result<(), RepoError> {
        UserRoleEntity::delete_by_id((user_id, role.as_str().to_string()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::info!(user_id = %user_id, role = %role, "Role revoked");
        Ok(())
    }
}
