//! PostgreSQL content store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DbConn, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{Comment, NewComment, Post, PostDraft, PostPatch};
use quill_core::ports::ContentStore;

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::like::{self, Entity as LikeEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::map_db_err;

/// Content store backed by the remote PostgreSQL database.
///
/// Inputs are expected to be validated (`PostDraft::prepare`, `PostPatch::prepare`)
/// before they reach the store; uniqueness and cascades are enforced by the schema.
#[derive(Clone)]
pub struct PostgresContentStore {
    db: DbConn,
}

impl PostgresContentStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    fn live_condition() -> Condition {
        let now = Utc::now();
        Condition::all().add(post::Column::Published.eq(true)).add(
            Condition::any()
                .add(post::Column::PublishAt.is_null())
                .add(post::Column::PublishAt.lte(now)),
        )
    }

    async fn comment_count(&self, post_id: Uuid) -> Result<i64, RepoError> {
        let count = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(count as i64)
    }

    /// Convert models and fill comment counts with a single grouped query.
    async fn annotate(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let counts: HashMap<Uuid, i64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .group_by(comment::Column::PostId)
            .into_tuple::<(Uuid, i64)>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .collect();

        Ok(models
            .into_iter()
            .map(|model| {
                let mut post: Post = model.into();
                post.comment_count = counts.get(&post.id).copied().unwrap_or(0);
                post
            })
            .collect())
    }

    async fn with_comment_count(
        &self,
        model: Option<post::Model>,
    ) -> Result<Option<Post>, RepoError> {
        let Some(model) = model else {
            return Ok(None);
        };
        let mut post: Post = model.into();
        post.comment_count = self.comment_count(post.id).await?;
        Ok(Some(post))
    }
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    async fn list_published(&self) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(Self::live_condition())
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        self.annotate(models).await
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        self.annotate(models).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(Self::live_condition())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        self.with_comment_count(model).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        self.with_comment_count(model).await
    }

    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError> {
        let post = Post::from_draft(draft, Utc::now());
        tracing::debug!(post_id = %post.id, slug = %post.slug, "Creating post");

        let active: post::ActiveModel = post.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut post: Post = model.into();
        post.apply(&patch, Utc::now());

        // Counters move independently of edits
        let mut active: post::ActiveModel = post.into();
        active.likes = NotSet;
        active.views = NotSet;
        active.created_at = NotSet;

        let model = active.update(&self.db).await.map_err(map_db_err)?;
        let mut post: Post = model.into();
        post.comment_count = self.comment_count(id).await?;
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await;

        if let Err(e) = result {
            tracing::warn!(post_id = %id, error = %e, "Failed to increment view count");
        }
    }

    async fn toggle_like(&self, id: Uuid, identity: &str) -> Result<bool, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let key = (id, identity.to_string());

        let existing = LikeEntity::find_by_id(key.clone())
            .one(&txn)
            .await
            .map_err(map_db_err)?;

        let liked = if existing.is_some() {
            LikeEntity::delete_by_id(key)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            PostEntity::update_many()
                .col_expr(post::Column::Likes, Expr::cust("GREATEST(likes - 1, 0)"))
                .filter(post::Column::Id.eq(id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            false
        } else {
            let updated = PostEntity::update_many()
                .col_expr(post::Column::Likes, Expr::col(post::Column::Likes).add(1))
                .filter(post::Column::Id.eq(id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            if updated.rows_affected == 0 {
                return Err(RepoError::NotFound);
            }
            LikeEntity::insert(like::ActiveModel {
                post_id: Set(id),
                identity: Set(identity.to_string()),
                created_at: Set(Utc::now().into()),
            })
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;
            true
        };

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(post_id = %id, liked, "Like toggled");
        Ok(liked)
    }

    async fn has_liked(&self, id: Uuid, identity: &str) -> Result<bool, RepoError> {
        let existing = LikeEntity::find_by_id((id, identity.to_string()))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(existing.is_some())
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let models = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let exists = PostEntity::find_by_id(comment.post_id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .is_some();
        if !exists {
            return Err(RepoError::NotFound);
        }

        let active: comment::ActiveModel = comment.into_comment(Utc::now()).into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let result = CommentEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
